//! pg_dump option flags

/// Independent `pg_dump` switches.
///
/// Flags are translated, not validated: `if_exists` without `clean` is
/// passed through and left for `pg_dump` to reject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// `--data-only`: dump only the data, not the schema.
    pub data_only: bool,

    /// `--schema-only`: dump only the object definitions, not data.
    pub schema_only: bool,

    /// `--clean`: emit DROP commands before the CREATE commands.
    pub clean: bool,

    /// `--if-exists`: use `DROP ... IF EXISTS` in clean mode.
    pub if_exists: bool,

    /// `--create`: begin the output with a command creating the database itself.
    pub create: bool,

    /// `--no-comments`: do not dump comments.
    pub no_comments: bool,
}

impl DumpOptions {
    /// Invocation flags for the set options, in fixed order.
    pub fn flags(&self) -> Vec<&'static str> {
        [
            (self.data_only, "--data-only"),
            (self.schema_only, "--schema-only"),
            (self.clean, "--clean"),
            (self.if_exists, "--if-exists"),
            (self.create, "--create"),
            (self.no_comments, "--no-comments"),
        ]
        .into_iter()
        .filter_map(|(set, flag)| set.then_some(flag))
        .collect()
    }
}
