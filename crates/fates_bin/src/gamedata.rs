//! Table layouts of `GameData.bin` and appending new entries to it.

use bon::Builder;
use byteorder::{LittleEndian, WriteBytesExt};
use derive_more::{Deref, DerefMut, Display};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::labels::LabelPool;
use crate::read::BinFile;
use crate::relocate::{put_int, IntField, IntWidth, LabelField, NewEntry, Relocation, TableLayout};
use crate::types::LabelTag;

/// Size of a character row
pub const CHARACTER_SIZE: u32 = 0x98;
/// Size of one attack stance entry
pub const ATTACK_STANCE_SIZE: u32 = 20;
/// Size of one defense stance entry
pub const DEFENSE_STANCE_SIZE: u32 = 40;
/// Size of one partner inside a support block
pub const SUPPORT_ENTRY_SIZE: u32 = 12;

const ATTACK_STANCE_POINTER: u32 = 0x1C;
const DEFENSE_STANCE_POINTER: u32 = 0x20;
const CHARACTER_ID: u32 = 0x24;
const SUPPORT_ID: u32 = 0x30;

/// Tables found in `GameData.bin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TableKind {
    Chapter,
    Character,
    Support,
    Class,
    Skill,
    Stat,
    Army,
    Item,
    Tutorial,
}

impl TableKind {
    pub const ALL: [TableKind; 9] = [
        TableKind::Chapter,
        TableKind::Character,
        TableKind::Support,
        TableKind::Class,
        TableKind::Skill,
        TableKind::Stat,
        TableKind::Army,
        TableKind::Item,
        TableKind::Tutorial,
    ];

    /// Offset of each label pointer in a row and the prefix of its text
    pub const fn label_fields(self) -> &'static [(u32, &'static str)] {
        match self {
            TableKind::Chapter => &[(0x0, "CID")],
            TableKind::Character => &[
                (0x8, "PID"),
                (0xC, "FID"),
                (0x10, "AID"),
                (0x14, "MPID"),
                (0x18, "MPID_H"),
            ],
            TableKind::Support => &[],
            TableKind::Class => &[(0x8, "JID"), (0xC, "FID"), (0x10, "MJID"), (0x14, "MJID_H")],
            TableKind::Skill => &[(0x0, "SEID"), (0x4, "MSEID"), (0x8, "MSEID_H")],
            TableKind::Stat => &[(0x0, "MID"), (0x4, "MID_H")],
            TableKind::Army => &[(0x4, "BID"), (0x8, "BID_H")],
            TableKind::Item => &[(0x8, "IID"), (0xC, "MIID"), (0x10, "MIID_H")],
            TableKind::Tutorial => &[(0x0, "TUTID"), (0x8, "MTUTID"), (0xC, "MTUTID_H")],
        }
    }
}

/// Options for [`GameData::append_characters`]
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct CharacterAppend {
    /// New characters, in order
    pub characters: Vec<NewEntry>,

    /// Number of partners in a fresh support block, for the first characters
    #[builder(default)]
    pub supports: Vec<u16>,

    /// Give every new character its own attack stance entry
    #[builder(default = true)]
    pub attack: bool,

    /// Give every new character its own defense stance entry
    #[builder(default = true)]
    pub defense: bool,
}

/// A `GameData.bin` container
///
/// Table positions are read from the pointers at the start of the data region,
/// so layouts stay correct after earlier appends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct GameData(BinFile);

impl GameData {
    pub fn new(bin: BinFile) -> Self {
        GameData(bin)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(GameData(BinFile::parse(bytes)?))
    }

    pub fn into_inner(self) -> BinFile {
        self.0
    }

    /// Locate `kind` in the data region
    pub fn layout(&self, kind: TableKind) -> Result<TableLayout> {
        let labels = kind
            .label_fields()
            .iter()
            .map(|(offset, prefix)| LabelField::new(*offset, *prefix))
            .collect();
        let int = IntField::new;

        let (offset, count, row_size, id) = match kind {
            TableKind::Chapter => {
                let o = self.read_u32(0x0)?;
                (o, int(0x8, IntWidth::U16), 0x1C, int(0x4, IntWidth::U8))
            }
            TableKind::Character => {
                let o = self.read_u32(0x8)?;
                (
                    o + 0x10,
                    int(o + 0x4, IntWidth::U16),
                    CHARACTER_SIZE,
                    int(CHARACTER_ID, IntWidth::U16),
                )
            }
            TableKind::Support => {
                let o = self.read_u32(self.read_u32(0x8)? + 0x8)?;
                return Ok(TableLayout::builder()
                    .offset(o + 0x4)
                    .count(int(o, IntWidth::U32))
                    .build());
            }
            TableKind::Class => {
                let o = self.read_u32(0xC)?;
                (o + 0x8, int(o + 0x6, IntWidth::U16), 0x80, int(0x18, IntWidth::U16))
            }
            TableKind::Skill => {
                let o = self.read_u32(0x10)?;
                (o + 0x10, int(0x18, IntWidth::U16), 0x20, int(0x10, IntWidth::U16))
            }
            TableKind::Stat => {
                let o = self.read_u32(0x1C)?;
                (o, int(0x20, IntWidth::U16), 0x40, int(0x0, IntWidth::U8))
            }
            TableKind::Army => {
                let o = self.read_u32(0x24)?;
                (o, int(0x28, IntWidth::U16), 0x10, int(0x0, IntWidth::U8))
            }
            TableKind::Item => {
                let o = self.read_u32(0x2C)?;
                (o + 0x8, int(o + 0x6, IntWidth::U16), 0x68, int(0x14, IntWidth::U16))
            }
            // shares the character block pointer
            TableKind::Tutorial => {
                let o = self.read_u32(0x8)?;
                (o + 0x10, int(o + 0x6, IntWidth::U16), 0x14, int(0x0, IntWidth::U8))
            }
        };

        Ok(TableLayout::builder()
            .offset(offset)
            .count(count)
            .row_size(row_size)
            .id(id)
            .labels(labels)
            .build())
    }

    /// Append rows to one fixed size table
    #[instrument(skip(self, entries), err, fields(rows = entries.len()))]
    pub fn append(&mut self, kind: TableKind, entries: &[NewEntry]) -> Result<()> {
        let layout = self.layout(kind)?;
        if layout.row_size.is_none() {
            return Err(Error::UnsupportedTable(kind));
        }

        self.0.append_rows(&layout, entries)
    }

    /// Append characters together with their stance entries and support blocks.
    ///
    /// Five zones are inserted: the character rows, the attack and defense stance
    /// entries, the support pointers and the support blocks. Each zone is placed
    /// right after the last existing entry of its table, and the tables are
    /// expected to appear in that order in the data region.
    #[instrument(skip_all, err, fields(characters = options.characters.len(), supports = options.supports.len()))]
    pub fn append_characters(&mut self, options: &CharacterAppend) -> Result<()> {
        let entries = &options.characters;
        if entries.is_empty() {
            return Err(Error::InvalidArgument("no characters to append".to_string()));
        }
        if options.supports.len() > entries.len() {
            return Err(Error::InvalidArgument(format!(
                "{} support blocks given for {} characters",
                options.supports.len(),
                entries.len()
            )));
        }

        let layout = self.layout(TableKind::Character)?;
        let support = self.layout(TableKind::Support)?;

        let old_count = self.read_int(layout.count)?;
        if old_count == 0 {
            return Err(Error::InvalidArgument(
                "stance tables cannot be located without existing characters".to_string(),
            ));
        }
        let end = self.region_end(layout.offset, CHARACTER_SIZE, old_count)?;

        let mut attack_end = 0;
        let mut defense_end = 0;
        for i in 0..old_count {
            let row = layout.offset + i * CHARACTER_SIZE;
            let attack = self.read_u32(row + ATTACK_STANCE_POINTER)?;
            attack_end = attack_end.max(self.region_end(attack, ATTACK_STANCE_SIZE, 1)?);
            let defense = self.read_u32(row + DEFENSE_STANCE_POINTER)?;
            defense_end = defense_end.max(self.region_end(defense, DEFENSE_STANCE_SIZE, 1)?);
        }

        let old_supports = self.read_int(support.count)?;
        let support_pointers_end = self.region_end(support.offset, 4, old_supports)?;
        let last_support = (0..old_supports)
            .map(|i| self.read_u32(support.offset + 4 * i))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .max()
            .ok_or_else(|| Error::InvalidArgument("support table is empty".to_string()))?;
        let partners = self.read_u16(last_support + 2)? as u32;
        let support_data_end = self.region_end(last_support, 4 + SUPPORT_ENTRY_SIZE * partners, 1)?;

        let count = entries.len() as u32;
        let attack_len = if options.attack { ATTACK_STANCE_SIZE * count } else { 0 };
        let defense_len = if options.defense { DEFENSE_STANCE_SIZE * count } else { 0 };
        let support_len: u32 = options
            .supports
            .iter()
            .map(|n| 4 + SUPPORT_ENTRY_SIZE * *n as u32)
            .sum();
        let stances = options.attack as usize + options.defense as usize;

        let relocation = Relocation::new(
            &self.0,
            vec![
                (end, CHARACTER_SIZE * count),
                (attack_end, attack_len),
                (defense_end, defense_len),
                (support_pointers_end, 4 * options.supports.len() as u32),
                (support_data_end, support_len),
            ],
            (layout.labels.len() + stances) * entries.len() + options.supports.len(),
            entries.len(),
        );
        debug!(
            end,
            attack_end,
            defense_end,
            support_pointers_end,
            support_data_end,
            label_diff = relocation.label_diff(),
            "appending characters"
        );

        let base = relocation.label_base();
        let mut rows = vec![0; (CHARACTER_SIZE * count) as usize];
        let mut pool = LabelPool::starting_at(self.labels().len() as u32);
        let mut pointer1 = Vec::new();
        let mut pointer2 = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let i = i as u32;
            let row = i * CHARACTER_SIZE;
            let start = relocation.position(0) + row;

            for field in &layout.labels {
                let label = pool.push(&field.label_for(&entry.name))?;
                if field.offset == layout.labels[0].offset {
                    pointer2.push(LabelTag::new(start, label));
                }
                put_int(&mut rows, row + field.offset, IntWidth::U32, base + label)?;
                pointer1.push(start + field.offset);
            }
            if options.attack {
                let stance = relocation.position(1) + i * ATTACK_STANCE_SIZE;
                put_int(&mut rows, row + ATTACK_STANCE_POINTER, IntWidth::U32, stance)?;
                pointer1.push(start + ATTACK_STANCE_POINTER);
            }
            if options.defense {
                let stance = relocation.position(2) + i * DEFENSE_STANCE_SIZE;
                put_int(&mut rows, row + DEFENSE_STANCE_POINTER, IntWidth::U32, stance)?;
                pointer1.push(start + DEFENSE_STANCE_POINTER);
            }
            put_int(&mut rows, row + CHARACTER_ID, IntWidth::U16, entry.id)?;
            put_int(&mut rows, row + SUPPORT_ID, IntWidth::U16, entry.id)?;
        }

        let mut support_pointers = Vec::with_capacity(4 * options.supports.len());
        let mut support_blocks = Vec::with_capacity(support_len as usize);
        let mut target = relocation.position(4);
        for (i, (entry, partners)) in entries.iter().zip(&options.supports).enumerate() {
            support_pointers.write_u32::<LittleEndian>(target)?;
            pointer1.push(relocation.position(3) + 4 * i as u32);

            // ids were range checked while filling the rows
            support_blocks.write_u16::<LittleEndian>(entry.id as u16)?;
            support_blocks.write_u16::<LittleEndian>(*partners)?;
            let partners = SUPPORT_ENTRY_SIZE * *partners as u32;
            support_blocks.resize(support_blocks.len() + partners as usize, 0);
            target += 4 + partners;
        }

        self.write_int(support.count, old_supports + options.supports.len() as u32)?;
        self.write_int(layout.count, old_count + count)?;
        self.0.splice(
            &relocation,
            vec![
                rows,
                vec![0; attack_len as usize],
                vec![0; defense_len as usize],
                support_pointers,
                support_blocks,
            ],
            pointer1,
            pointer2,
            pool.into_bytes(),
        )
    }
}
