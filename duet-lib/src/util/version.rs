pub mod built_info {
    use lazy_static::lazy_static;
    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    /// The package version, suffixed with the short git commit hash (and `-dirty` for a modified
    /// working tree) when built from a git checkout.
    fn get_software_version() -> String {
        let prefix = match GIT_COMMIT_HASH {
            Some(hash) => format!("{PKG_VERSION}-{}", &hash[..8.min(hash.len())]),
            None => PKG_VERSION.to_string(),
        };
        let suffix = match GIT_DIRTY {
            Some(true) => "-dirty",
            _ => "",
        };
        format!("{prefix}{suffix}")
    }

    lazy_static! {
        /// Version of the software with git hash
        pub static ref VERSION: String = get_software_version();
    }
}
