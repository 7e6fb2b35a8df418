//! Static mock values for the build constants, used when the
//! generation step is not available (eg: read only file systems).

pub const COMPILATION_DATE: &str = "UNKNOWN";
pub const COMPILATION_TIME: &str = "UNKNOWN";
pub const NAME: &str = "dotmatrix";
pub const VERSION: &str = "x.x.x";
pub const COMPILER: &str = "rustc";
pub const COMPILER_VERSION: &str = "UNKNOWN";
pub const HOST: &str = "UNKNOWN";
pub const TARGET: &str = "UNKNOWN";
pub const PROFILE: &str = "UNKNOWN";
pub const OPT_LEVEL: &str = "UNKNOWN";
pub const FEATURES_SEQ: [&str; 1] = ["cpu"];
pub const PLATFORM_CPU_BITS: &str = "64";
