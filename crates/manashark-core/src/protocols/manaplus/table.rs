//! Opcode dispatch tables, one per origin.
//!
//! Both tables are literal data. They are indexed once into hash maps on first
//! use and never mutated afterwards, so lookups are safe from any thread.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::layout::{
    FieldKind::{self, Bytes, Hex, I16, Lookup, U8, U16, U32, U64},
    ITEMS, IntWidth, PLAYER_ACTIONS, RecordSpec, SPECIES, field, raw,
};
use super::origin::Origin;

const ID: FieldKind = Hex(IntWidth::Four);

static NODE_RECORDS: &[(i16, RecordSpec)] = &[
    (
        0x7d,
        RecordSpec {
            title: "Scenario change",
            fields: &[],
        },
    ),
    (
        0x85,
        RecordSpec {
            title: "Player move to",
            fields: &[raw(Bytes(3))],
        },
    ),
    (
        0x89,
        RecordSpec {
            title: "Player action",
            fields: &[
                field("Target", ID),
                field("Action", Lookup(IntWidth::One, &PLAYER_ACTIONS)),
            ],
        },
    ),
    (
        0x90,
        RecordSpec {
            title: "NPC dialog open",
            fields: &[field("ID", ID), field("Sub-dialog", U8)],
        },
    ),
    (
        0x94,
        RecordSpec {
            title: "Character visible",
            fields: &[field("ID", ID)],
        },
    ),
    (
        0x9b,
        RecordSpec {
            title: "Smash/dropped-item notice",
            fields: &[field("Unknown", Bytes(3))],
        },
    ),
    (
        0x9f,
        RecordSpec {
            title: "Player pickup item",
            fields: &[field("ID", Hex(IntWidth::One)), field("Unknown", Bytes(3))],
        },
    ),
    (
        0xb8,
        RecordSpec {
            title: "NPC dialog option display",
            fields: &[field("ID", ID), field("Sub-dialog", U8)],
        },
    ),
    (
        0xb9,
        RecordSpec {
            title: "NPC dialog next",
            fields: &[field("ID", ID)],
        },
    ),
    (
        0xbf,
        RecordSpec {
            title: "Server keepalive (frequent)",
            fields: &[field("Unknown", Bytes(1))],
        },
    ),
    (
        0xc5,
        RecordSpec {
            title: "Shop store open",
            fields: &[field("ID", ID)],
        },
    ),
    (
        0xc8,
        RecordSpec {
            title: "Shop buy item",
            fields: &[
                field("Unknown", Bytes(2)),
                field("Quantity", U16),
                field("Item", Lookup(IntWidth::Two, &ITEMS)),
            ],
        },
    ),
    (
        0xc9,
        RecordSpec {
            title: "Shop sell item",
            fields: &[
                field("Unknown", Bytes(2)),
                field("Item", Lookup(IntWidth::Two, &ITEMS)),
                field("Quantity", U16),
            ],
        },
    ),
    (
        0x118,
        RecordSpec {
            title: "NPC killed",
            fields: &[],
        },
    ),
    (
        0x146,
        RecordSpec {
            title: "NPC dialog close",
            fields: &[field("ID", ID)],
        },
    ),
    (
        0x210,
        RecordSpec {
            title: "Server keepalive (infrequent)",
            fields: &[],
        },
    ),
];

// Unlabelled host fields have no known meaning; only their width is fixed.
static HOST_RECORDS: &[(i16, RecordSpec)] = &[
    (
        0x78,
        RecordSpec {
            title: "NPC info",
            fields: &[
                field("ID", ID),
                raw(Bytes(1)),
                raw(U16),
                field("NPC", Lookup(IntWidth::Two, &SPECIES)),
                raw(U16),
                field("HP", U16),
                field("HP Max", U16),
                raw(U32),
                raw(Bytes(1)),
                raw(Bytes(1)),
                raw(Bytes(1)),
                raw(U32),
                raw(Bytes(1)),
            ],
        },
    ),
    (
        0x7b,
        RecordSpec {
            title: "NPC move",
            fields: &[
                field("ID", ID),
                raw(Bytes(1)),
                raw(Bytes(1)),
                raw(U32),
                raw(U16),
                field("NPC", Lookup(IntWidth::Two, &SPECIES)),
                raw(U32),
                raw(U16),
                raw(Hex(IntWidth::Four)),
                raw(U64),
                raw(U16),
                field("HP", U16),
                raw(U16),
                field("HP Max", U16),
                raw(U32),
                raw(U16),
                raw(U16),
                field("XY", Bytes(5)),
                raw(U32),
                raw(Bytes(1)),
            ],
        },
    ),
    (
        0x80,
        RecordSpec {
            title: "NPC monster check",
            fields: &[field("ID", ID), field("Unknown", Bytes(1))],
        },
    ),
    (
        0x87,
        RecordSpec {
            title: "Player move (host-reported)",
            fields: &[field("ID", ID), field("XY", Bytes(6))],
        },
    ),
    (
        0x8a,
        RecordSpec {
            title: "Fight",
            fields: &[
                field("Attacker", ID),
                field("Target", ID),
                raw(Hex(IntWidth::Four)),
                raw(I16),
                raw(I16),
                raw(I16),
                raw(I16),
                field("Attack", I16),
                raw(I16),
                raw(I16),
                raw(Bytes(1)),
            ],
        },
    ),
];

type Index = HashMap<i16, &'static RecordSpec>;

fn index(records: &'static [(i16, RecordSpec)]) -> Index {
    records.iter().map(|(opcode, spec)| (*opcode, spec)).collect()
}

static NODE_INDEX: LazyLock<Index> = LazyLock::new(|| index(NODE_RECORDS));
static HOST_INDEX: LazyLock<Index> = LazyLock::new(|| index(HOST_RECORDS));

/// Record layout for `opcode` as sent by `origin`.
pub fn lookup(origin: Origin, opcode: i16) -> Option<&'static RecordSpec> {
    let index = match origin {
        Origin::Host => &HOST_INDEX,
        Origin::Node => &NODE_INDEX,
    };
    index.get(&opcode).copied()
}

/// Every declared record for `origin`, in declaration order.
pub fn records(origin: Origin) -> &'static [(i16, RecordSpec)] {
    match origin {
        Origin::Host => HOST_RECORDS,
        Origin::Node => NODE_RECORDS,
    }
}
