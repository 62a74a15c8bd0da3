pub const PROGNAME: &str = "unsetup";
