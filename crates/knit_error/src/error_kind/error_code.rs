// Resolution
pub const UNRESOLVED_ENTRY: &str = "UNRESOLVED_ENTRY";
pub const EXTERNAL_ENTRY: &str = "EXTERNAL_ENTRY";
pub const UNRESOLVED_IMPORT: &str = "UNRESOLVED_IMPORT";
pub const PARSE_ERROR: &str = "PARSE_ERROR";

// Linking
pub const MISSING_EXPORT: &str = "MISSING_EXPORT";
pub const IMPORT_IS_UNDEFINED: &str = "IMPORT_IS_UNDEFINED";
pub const AMBIGUOUS_IMPORT: &str = "AMBIGUOUS_IMPORT";
pub const AMBIGUOUS_REEXPORT: &str = "AMBIGUOUS_REEXPORT";
pub const CIRCULAR_REEXPORT: &str = "CIRCULAR_REEXPORT";
pub const ASSIGN_TO_IMPORT: &str = "ASSIGN_TO_IMPORT";
pub const ASSIGN_TO_CONSTANT: &str = "ASSIGN_TO_CONSTANT";
pub const CALL_IMPORT_NAMESPACE: &str = "CALL_IMPORT_NAMESPACE";

// Module format
pub const TOP_LEVEL_RETURN: &str = "TOP_LEVEL_RETURN";
pub const TOP_LEVEL_AWAIT: &str = "TOP_LEVEL_AWAIT";
pub const REQUIRE_TOP_LEVEL_AWAIT: &str = "REQUIRE_TOP_LEVEL_AWAIT";
pub const THIS_IS_UNDEFINED: &str = "THIS_IS_UNDEFINED";
pub const UNSUPPORTED_REQUIRE: &str = "UNSUPPORTED_REQUIRE";

// Suspicious code
pub const EQUALS_NAN: &str = "EQUALS_NAN";
pub const EQUALS_NEGATIVE_ZERO: &str = "EQUALS_NEGATIVE_ZERO";
pub const EQUALS_NEW_OBJECT: &str = "EQUALS_NEW_OBJECT";
pub const SUSPICIOUS_TYPEOF: &str = "SUSPICIOUS_TYPEOF";

pub const INVALID_OPTION: &str = "INVALID_OPTION";
pub const PANIC: &str = "PANIC";
