//! Declarative record layouts.
//!
//! A record is a fixed sequence of little-endian fields; nothing in the
//! protocol carries a length prefix, so the sum of field widths is the record
//! width. Each field also decides how its raw bytes are shown.

/// Width of an integer field, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl IntWidth {
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

fn read_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Static code-to-name translation table.
#[derive(Debug)]
pub struct LookupTable {
    pub name: &'static str,
    pub entries: &'static [(u64, &'static str)],
}

impl LookupTable {
    pub fn get(&self, code: u64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == code)
            .map(|(_, name)| *name)
    }
}

pub static PLAYER_ACTIONS: LookupTable = LookupTable {
    name: "player-action",
    entries: &[(0x02, "Sit down"), (0x03, "Stand up"), (0x07, "Attack")],
};

pub static SPECIES: LookupTable = LookupTable {
    name: "species",
    entries: &[
        (0x3fc, "Fluffy"),
        (0x445, "White Smile"),
        (0x447, "White Bell"),
        (0x459, "Pollett"),
    ],
};

pub static ITEMS: LookupTable = LookupTable {
    name: "item",
    entries: &[
        (0x1f5, "Cactus Drink"),
        (0x1f6, "Cactus Potion"),
        (0x217, "Red Apple"),
    ],
};

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    I16,
    /// Unsigned identifier shown as zero-padded hex.
    Hex(IntWidth),
    /// Opaque bytes shown as contiguous hex.
    Bytes(usize),
    /// Coded value translated through a table; misses fall back to hex.
    Lookup(IntWidth, &'static LookupTable),
}

impl FieldKind {
    pub const fn width(&self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U16 | FieldKind::I16 => 2,
            FieldKind::U32 => 4,
            FieldKind::U64 => 8,
            FieldKind::Hex(width) | FieldKind::Lookup(width, _) => width.bytes(),
            FieldKind::Bytes(n) => *n,
        }
    }

    /// Canonical rendering of `bytes`, which must be exactly `width()` long.
    pub fn render(&self, bytes: &[u8]) -> String {
        debug_assert_eq!(bytes.len(), self.width());
        match self {
            FieldKind::U8 | FieldKind::U16 | FieldKind::U32 | FieldKind::U64 => {
                read_le(bytes).to_string()
            }
            FieldKind::I16 => i16::from_le_bytes([bytes[0], bytes[1]]).to_string(),
            FieldKind::Hex(width) => format_hex(read_le(bytes), *width),
            FieldKind::Bytes(_) => format_bytes(bytes),
            FieldKind::Lookup(width, table) => {
                let code = read_le(bytes);
                match table.get(code) {
                    Some(name) => name.to_string(),
                    None => format_hex(code, *width),
                }
            }
        }
    }
}

/// One captioned field. An empty label marks a field shown without caption.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct RecordSpec {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordSpec {
    /// Body width in bytes, excluding the 2-byte opcode.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|field| field.kind.width()).sum()
    }
}

pub const OPCODE_LEN: usize = 2;

pub const fn field(label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { label, kind }
}

pub const fn raw(kind: FieldKind) -> FieldSpec {
    FieldSpec { label: "", kind }
}

pub fn format_hex(value: u64, width: IntWidth) -> String {
    format!("0x{:0digits$x}", value, digits = width.bytes() * 2)
}

pub fn format_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, ITEMS, IntWidth, PLAYER_ACTIONS, SPECIES, format_bytes};

    #[test]
    fn integers_render_decimal() {
        assert_eq!(FieldKind::U8.render(&[0xff]), "255");
        assert_eq!(FieldKind::U16.render(&[0x20, 0x01]), "288");
        assert_eq!(FieldKind::U32.render(&[0x01, 0x00, 0x00, 0x80]), "2147483649");
        assert_eq!(FieldKind::U64.render(&[0xff; 8]), u64::MAX.to_string());
        assert_eq!(FieldKind::I16.render(&[0xfe, 0xff]), "-2");
    }

    #[test]
    fn hex_pads_to_declared_width() {
        assert_eq!(
            FieldKind::Hex(IntWidth::Four).render(&[0x7a, 0x8c, 0xf1, 0x34]),
            "0x34f18c7a"
        );
        assert_eq!(
            FieldKind::Hex(IntWidth::Four).render(&[0x65, 0xdb, 0x22, 0x00]),
            "0x0022db65"
        );
        assert_eq!(FieldKind::Hex(IntWidth::One).render(&[0x02]), "0x02");
    }

    #[test]
    fn bytes_render_contiguous_hex() {
        assert_eq!(FieldKind::Bytes(3).render(&[0x17, 0x03, 0x90]), "170390");
        assert_eq!(format_bytes(&[]), "");
    }

    #[test]
    fn lookup_hit_uses_name() {
        let kind = FieldKind::Lookup(IntWidth::Two, &SPECIES);
        assert_eq!(kind.render(&[0x47, 0x04]), "White Bell");
        let kind = FieldKind::Lookup(IntWidth::One, &PLAYER_ACTIONS);
        assert_eq!(kind.render(&[0x07]), "Attack");
    }

    #[test]
    fn lookup_miss_uses_code_width_not_record_width() {
        let kind = FieldKind::Lookup(IntWidth::Two, &SPECIES);
        assert_eq!(kind.render(&[0xcd, 0xab]), "0xabcd");
        let kind = FieldKind::Lookup(IntWidth::Two, &ITEMS);
        assert_eq!(kind.render(&[0x30, 0x00]), "0x0030");
        let kind = FieldKind::Lookup(IntWidth::One, &PLAYER_ACTIONS);
        assert_eq!(kind.render(&[0xe6]), "0xe6");
    }

    #[test]
    fn lookup_zero_code_is_not_a_default_name() {
        let kind = FieldKind::Lookup(IntWidth::Two, &SPECIES);
        assert_eq!(kind.render(&[0x00, 0x00]), "0x0000");
    }
}
