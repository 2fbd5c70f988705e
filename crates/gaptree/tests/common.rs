#![allow(missing_docs)]
#![allow(dead_code)]

use gaptree::{Consumer, TreeBuffer, TreeError};

/// A small catalog document with attributes, mixed content and every scalar
/// class, used by several test binaries.
pub fn catalog() -> Result<TreeBuffer, TreeError> {
    let mut tree = TreeBuffer::new();
    tree.begin_document()?;
    tree.begin_group("catalog", None)?;
    attribute(&mut tree, "version", |t| t.write_int(2))?;

    tree.begin_group("book", None)?;
    attribute(&mut tree, "id", |t| t.write_str("b1"))?;
    attribute(&mut tree, "lang", |t| t.write_str("en"))?;
    leaf(&mut tree, "title", |t| t.write_str("Dune"))?;
    leaf(&mut tree, "year", |t| t.write_int(1965))?;
    leaf(&mut tree, "price", |t| t.write_double(9.5))?;
    tree.end_group("book")?;

    tree.begin_group("book", None)?;
    attribute(&mut tree, "id", |t| t.write_str("b2"))?;
    leaf(&mut tree, "title", |t| t.write_str("Solaris"))?;
    leaf(&mut tree, "flags", |t| {
        t.write_bool(true)?;
        t.write_bool(false)?;
        t.write_byte(7)
    })?;
    tree.end_group("book")?;

    tree.write_str("note: ")?;
    tree.write_long(3)?;
    tree.write_str(" items")?;
    tree.end_group("catalog")?;
    tree.end_document()?;
    Ok(tree)
}

fn attribute(
    tree: &mut TreeBuffer,
    name: &str,
    body: impl FnOnce(&mut TreeBuffer) -> Result<(), TreeError>,
) -> Result<(), TreeError> {
    tree.begin_attribute(name, None)?;
    body(tree)?;
    tree.end_attribute()
}

fn leaf(
    tree: &mut TreeBuffer,
    name: &str,
    body: impl FnOnce(&mut TreeBuffer) -> Result<(), TreeError>,
) -> Result<(), TreeError> {
    tree.begin_group(name, None)?;
    body(tree)?;
    tree.end_group(name)
}

#[test]
fn catalog_is_well_formed() {
    let tree = catalog().unwrap();
    assert!(!tree.has_open_spans());
    assert_eq!(tree.size().unwrap(), 1);
}
