use fates_table::error::Result;
use fates_table::{record, Label, Record, Table};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

record! {
    pub struct Item {
        pub iid: Label,
        pub miid: Label,
        pub id: u16 => Hex,
        pub might: u8,
        pub hit: i8,
        pub ranges: [u8; 2],
    }
}

fn items() -> Vec<Item> {
    vec![
        Item {
            iid: Label::from("IID_BRONZE"),
            miid: Label::from("MIID_BRONZE"),
            id: 1,
            might: 3,
            hit: 90,
            ranges: [1, 1],
        },
        Item {
            iid: Label::from("IID_BOW"),
            miid: Label::null(),
            id: 0x102,
            might: 4,
            hit: -5,
            ranges: [2, 2],
        },
    ]
}

#[traced_test]
#[test]
fn table_text_round_trip() -> Result<()> {
    let table = Table::from_records(&items());

    let text = table.to_text();
    assert_eq!(
        text,
        "IID_BRONZE\tMIID_BRONZE\t0x0001\t3\t90\t1\t1\nIID_BOW\tNULL\t0x0102\t4\t-5\t2\t2"
    );

    let parsed = Table::from_text(Item::SCHEMA, &text)?;
    assert_eq!(parsed, table);
    assert_eq!(parsed.to_records::<Item>()?, items());

    Ok(())
}

#[test]
fn table_json_view() -> Result<()> {
    let table = Table::from_records(&items());

    assert_eq!(
        table.to_json(),
        serde_json::json!([
            { "iid": "IID_BRONZE", "miid": "MIID_BRONZE", "id": 1, "might": 3, "hit": 90, "ranges": [1, 1] },
            { "iid": "IID_BOW", "miid": "NULL", "id": 258, "might": 4, "hit": -5, "ranges": [2, 2] },
        ])
    );
    assert_eq!(
        serde_json::to_string(&table.rows()[1]).map_err(|e| {
            fates_table::error::Error::StructureMismatch(e.to_string())
        })?,
        r#"{"iid":"IID_BOW","miid":"NULL","id":258,"might":4,"hit":-5,"ranges":[2,2]}"#
    );

    Ok(())
}

#[test]
fn schema_header() {
    assert_eq!(
        Item::SCHEMA.header(),
        ["iid", "miid", "id", "might", "hit", "ranges[0]", "ranges[1]"]
    );
    assert_eq!(Item::SCHEMA.size(), 4 + 4 + 2 + 1 + 1 + 2);
}
