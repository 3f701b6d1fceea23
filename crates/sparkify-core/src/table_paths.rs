//! Canonical output layout for the star schema.
//!
//! This module is the single source of truth for where each output table
//! lives under the output root and how it is partitioned.
//!
//! # Layout
//!
//! ```text
//! {output}/
//! ├── songs_table/songs_table.parquet/year={year}/artist_id={artist_id}/
//! ├── artists_table/artists_table.parquet/
//! ├── users_table/users_table.parquet/
//! ├── time_table/time_table.parquet/year={year}/month={month}/
//! └── songplays_table/songplays_table.parquet/year={year}/month={month}/
//! ```
//!
//! Locations always end with `/` so writers treat them as directories.

/// The five tables produced by the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StarTable {
    /// Songs dimension.
    Songs,
    /// Artists dimension.
    Artists,
    /// Users dimension.
    Users,
    /// Time dimension.
    Time,
    /// Songplays fact table.
    Songplays,
}

impl StarTable {
    /// Returns the table name used in directory names and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Songs => "songs_table",
            Self::Artists => "artists_table",
            Self::Users => "users_table",
            Self::Time => "time_table",
            Self::Songplays => "songplays_table",
        }
    }

    /// Returns all tables in the order the job writes them.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Songs,
            Self::Artists,
            Self::Users,
            Self::Time,
            Self::Songplays,
        ]
    }

    /// Returns the columns the table is physically partitioned by.
    #[must_use]
    pub const fn partition_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Songs => &["year", "artist_id"],
            Self::Artists | Self::Users => &[],
            Self::Time | Self::Songplays => &["year", "month"],
        }
    }

    /// Returns the table's directory under `output_root`.
    ///
    /// # Example
    ///
    /// ```
    /// use sparkify_core::StarTable;
    ///
    /// assert_eq!(
    ///     StarTable::Time.location("s3a://bucket/out/"),
    ///     "s3a://bucket/out/time_table/time_table.parquet/"
    /// );
    /// ```
    #[must_use]
    pub fn location(&self, output_root: &str) -> String {
        let root = output_root.trim_end_matches('/');
        let name = self.as_str();
        format!("{root}/{name}/{name}.parquet/")
    }
}

impl std::fmt::Display for StarTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
