//! Hessian 2.0 tag byte table.
//!
//! Every encoded value starts with one tag byte. Many kinds reserve a whole
//! range of tags and fold a small length or magnitude into the tag itself
//! (`int ::= x80 - xbf`, `string ::= x00 - x1f <utf8-data>`, ...). The
//! constants below name the fixed tags and the zero point of each range.

pub const NULL: u8 = b'N';
pub const TRUE: u8 = b'T';
pub const FALSE: u8 = b'F';

/// `int ::= 'I' b3 b2 b1 b0`
pub const INT: u8 = b'I';
/// `int ::= x80 - xbf` (value = tag - 0x90)
pub const INT_DIRECT_MIN: i32 = -0x10;
pub const INT_DIRECT_MAX: i32 = 0x2f;
pub const INT_ZERO: u8 = 0x90;
/// `int ::= xc0 - xcf b0` (value = ((tag - 0xc8) << 8) + b0)
pub const INT_BYTE_MIN: i32 = -0x800;
pub const INT_BYTE_MAX: i32 = 0x7ff;
pub const INT_BYTE_ZERO: u8 = 0xc8;
/// `int ::= xd0 - xd7 b1 b0` (value = ((tag - 0xd4) << 16) + (b1 << 8) + b0)
pub const INT_SHORT_MIN: i32 = -0x40000;
pub const INT_SHORT_MAX: i32 = 0x3ffff;
pub const INT_SHORT_ZERO: u8 = 0xd4;

/// `long ::= 'L' b7 .. b0`
pub const LONG: u8 = b'L';
/// `long ::= xd8 - xef` (value = tag - 0xe0)
pub const LONG_DIRECT_MIN: i64 = -0x08;
pub const LONG_DIRECT_MAX: i64 = 0x0f;
pub const LONG_ZERO: u8 = 0xe0;
/// `long ::= xf0 - xff b0`
pub const LONG_BYTE_MIN: i64 = -0x800;
pub const LONG_BYTE_MAX: i64 = 0x7ff;
pub const LONG_BYTE_ZERO: u8 = 0xf8;
/// `long ::= x38 - x3f b1 b0`
pub const LONG_SHORT_MIN: i64 = -0x40000;
pub const LONG_SHORT_MAX: i64 = 0x3ffff;
pub const LONG_SHORT_ZERO: u8 = 0x3c;
/// `long ::= x59 b3 b2 b1 b0`
pub const LONG_INT: u8 = 0x59;

pub const DOUBLE: u8 = b'D';
pub const DOUBLE_ZERO: u8 = 0x5b;
pub const DOUBLE_ONE: u8 = 0x5c;
pub const DOUBLE_BYTE: u8 = 0x5d;
pub const DOUBLE_SHORT: u8 = 0x5e;
/// `double ::= x5f b3 b2 b1 b0` (value = int * 0.001)
pub const DOUBLE_MILL: u8 = 0x5f;

/// `date ::= x4a b7 .. b0` (milliseconds since the epoch)
pub const DATE: u8 = 0x4a;
/// `date ::= x4b b3 b2 b1 b0` (minutes since the epoch)
pub const DATE_MINUTE: u8 = 0x4b;

/// Non-final string chunk.
pub const STRING_CHUNK: u8 = b'R';
/// Final string chunk.
pub const STRING: u8 = b'S';
pub const STRING_DIRECT_MAX: usize = 0x1f;
pub const STRING_SHORT: u8 = 0x30;
pub const STRING_SHORT_MAX: usize = 0x3ff;

/// Non-final binary chunk.
pub const BINARY_CHUNK: u8 = b'A';
/// Final binary chunk.
pub const BINARY: u8 = b'B';
pub const BINARY_DIRECT: u8 = 0x20;
pub const BINARY_DIRECT_MAX: usize = 0x0f;
pub const BINARY_SHORT: u8 = 0x34;
pub const BINARY_SHORT_MAX: usize = 0x3ff;

/// `list ::= x55 type value* 'Z'`
pub const LIST_VARIABLE: u8 = 0x55;
/// `list ::= 'V' type int value*`
pub const LIST_FIXED: u8 = b'V';
/// `list ::= x57 value* 'Z'`
pub const LIST_VARIABLE_UNTYPED: u8 = 0x57;
/// `list ::= x58 int value*`
pub const LIST_FIXED_UNTYPED: u8 = 0x58;
/// `list ::= x70 - x77 type value*`
pub const LIST_DIRECT: u8 = 0x70;
/// `list ::= x78 - x7f value*`
pub const LIST_DIRECT_UNTYPED: u8 = 0x78;
pub const LIST_DIRECT_MAX: usize = 0x07;

/// `map ::= 'M' type (value value)* 'Z'`
pub const MAP: u8 = b'M';
/// `map ::= 'H' (value value)* 'Z'`
pub const MAP_UNTYPED: u8 = b'H';

/// `class-def ::= 'C' string int string*`
pub const CLASS_DEF: u8 = b'C';
/// `object ::= 'O' int value*`
pub const OBJECT: u8 = b'O';
/// `object ::= x60 - x6f value*`
pub const OBJECT_DIRECT: u8 = 0x60;
pub const OBJECT_DIRECT_MAX: usize = 0x0f;

/// `ref ::= x51 int`
pub const REF: u8 = 0x51;
pub const END: u8 = b'Z';

// RPC envelopes (outside the value grammar)
pub const VERSION: u8 = b'H';
pub const CALL: u8 = b'C';
pub const REPLY: u8 = b'R';
pub const FAULT: u8 = b'F';
pub const ENVELOPE: u8 = b'E';
pub const MESSAGE: u8 = b'p';
pub const MESSAGE_ALT: u8 = b'P';
pub const MESSAGE_END_ALT: u8 = b'z';
pub const MAJOR_VERSION: u8 = 0x02;
pub const MINOR_VERSION: u8 = 0x00;

/// Returns `true` for every tag that starts a string value or string chunk.
#[inline]
pub fn is_string(tag: u8) -> bool {
    matches!(tag, 0x00..=0x1f | 0x30..=0x33 | STRING_CHUNK | STRING)
}

/// Returns `true` for every tag that starts a binary value or binary chunk.
#[inline]
pub fn is_binary(tag: u8) -> bool {
    matches!(tag, 0x20..=0x2f | 0x34..=0x37 | BINARY_CHUNK | BINARY)
}

/// Human-readable name of the value kind a tag introduces.
///
/// Tags outside the value grammar return `"unknown"`.
pub fn describe(tag: u8) -> &'static str {
    match tag {
        NULL => "null",
        TRUE | FALSE => "boolean",
        0x80..=0xbf | 0xc0..=0xcf | 0xd0..=0xd7 | INT => "int",
        0xd8..=0xef | 0xf0..=0xff | 0x38..=0x3f | LONG_INT | LONG => "long",
        DOUBLE_ZERO..=DOUBLE_MILL | DOUBLE => "double",
        DATE | DATE_MINUTE => "date",
        0x00..=0x1f | 0x30..=0x33 | STRING => "string",
        STRING_CHUNK => "string chunk",
        0x20..=0x2f | 0x34..=0x37 | BINARY => "binary",
        BINARY_CHUNK => "binary chunk",
        LIST_VARIABLE | LIST_FIXED | LIST_VARIABLE_UNTYPED | LIST_FIXED_UNTYPED | 0x70..=0x7f => "list",
        MAP | MAP_UNTYPED => "map",
        CLASS_DEF => "class definition",
        OBJECT | 0x60..=0x6f => "object",
        REF => "ref",
        END => "end",
        _ => "unknown",
    }
}

/// Formats a tag for error messages: `0x53 (S)`, `0x90` or `end of file`.
pub fn code_name(tag: Option<u8>) -> String {
    match tag {
        None => "end of file".to_string(),
        Some(b) if b.is_ascii_graphic() => format!("0x{b:02x} ({})", b as char),
        Some(b) => format!("0x{b:02x}"),
    }
}
