use alloc::string::String;
use core::fmt::{self, Write};

use crate::{
    codec::{self, Record},
    tree::TreeBuffer,
};

impl TreeBuffer {
    /// A listing of every live record with its raw units, one per line.
    ///
    /// Meant for diagnostics: undecodable units are listed one at a time
    /// instead of aborting the listing.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a `String` cannot fail.
        let _ = self.write_dump(&mut out);
        out
    }

    fn write_dump(&self, out: &mut String) -> fmt::Result {
        let gap = &self.gap;
        writeln!(
            out,
            "TreeBuffer gap_start:{} gap_end:{} capacity:{}",
            gap.gap_start(),
            gap.gap_end(),
            gap.capacity()
        )?;
        for (start, end) in [(0, gap.gap_start()), (gap.gap_end(), gap.capacity())] {
            let mut index = start;
            while index < end {
                write!(out, "{index}:")?;
                match codec::decode(gap, index) {
                    Ok(unit) => {
                        for i in index..(index + unit.width).min(end) {
                            write!(out, " {:04x}", gap.get(i).unwrap_or_default())?;
                        }
                        out.push_str(" = ");
                        self.describe(unit.record, out)?;
                        index += unit.width;
                    }
                    Err(err) => {
                        write!(out, " {:04x} = ?? {err}", gap.get(index).unwrap_or_default())?;
                        index += 1;
                    }
                }
                out.push('\n');
            }
        }
        Ok(())
    }

    fn describe(&self, record: Record, out: &mut String) -> fmt::Result {
        let name = |index| self.objects.name(index).map_or("?", |name| &**name);
        match record {
            Record::Char(ch) => write!(out, "char {ch:?}"),
            Record::Byte(v) => write!(out, "byte {v}"),
            Record::Bool(v) => write!(out, "bool {v}"),
            Record::Int(v) => write!(out, "int {v}"),
            Record::Long(v) => write!(out, "long {v}"),
            Record::Float(v) => write!(out, "float {v}"),
            Record::Double(v) => write!(out, "double {v}"),
            Record::Object(slot) => match self.objects.object(slot) {
                Ok(object) => write!(out, "object #{slot} = {object:?}"),
                Err(_) => write!(out, "object #{slot} = ?"),
            },
            Record::PositionRef(slot) => write!(out, "position ref #{slot}"),
            Record::PositionPair { seq, pos } => write!(out, "position #{seq} {pos:?}"),
            Record::BeginGroup {
                type_index,
                end,
                form,
            } => write!(
                out,
                "begin group {form:?} #{type_index} <{}> end:{end}",
                name(type_index)
            ),
            Record::EndGroup { type_index, form } => {
                write!(out, "end group {form:?} #{type_index} </{}>", name(type_index))
            }
            Record::BeginAttribute { type_index, end } => write!(
                out,
                "begin attribute #{type_index} {} end:{end}",
                name(type_index)
            ),
            Record::EndAttribute => out.write_str("end attribute"),
            Record::BeginDocument { end } => write!(out, "begin document end:{end}"),
            Record::EndDocument => out.write_str("end document"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Consumer, TreeBuffer};

    #[test]
    fn lists_records_and_bad_units() {
        let mut tree = TreeBuffer::new();
        tree.begin_group("a", None).unwrap();
        tree.write_int(70_000).unwrap();
        tree.end_group("a").unwrap();
        tree.write_char('z').unwrap();
        tree.gap.set(8, 0xF1FF);

        let dump = tree.dump();
        let lines: alloc::vec::Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "TreeBuffer gap_start:9 gap_end:200 capacity:200");
        assert_eq!(lines[1], "0: a000 0006 0000 = begin group Short #0 <a> end:6");
        assert_eq!(lines[2], "3: f102 0001 1170 = int 70000");
        assert_eq!(lines[3], "6: f10b 0006 = end group Short #0 </a>");
        assert!(lines[4].starts_with("8: f1ff = ?? unknown code 0xf1ff"));
    }
}
