//! In-place rewrite of `LineNumberTable` attributes in compiled classes.
//!
//! Only line values change, never structure or lengths, so the transform
//! copies the input buffer and patches the affected big-endian u16s at their
//! original offsets. The constant pool is scanned once to resolve attribute
//! names; everything else is skipped structurally.

use anyhow::{Context, Result, bail, ensure};

use crate::linemap::ClassLineMap;

const MAGIC: u32 = 0xCAFE_BABE;

/// Rewrites every debug line-number entry in `bytes` through the class's
/// line map and returns the patched class file.
pub fn remap_line_numbers(bytes: &[u8], map: &ClassLineMap) -> Result<Vec<u8>> {
    patch_line_numbers(bytes, |line| {
        map.remap_line(i32::from(line)).clamp(0, i32::from(u16::MAX)) as u16
    })
}

/// Walks the class structure and applies `patch` to each `LineNumberTable`
/// line value, writing results into a copy of the input at the same offsets.
fn patch_line_numbers(bytes: &[u8], mut patch: impl FnMut(u16) -> u16) -> Result<Vec<u8>> {
    let mut out = bytes.to_vec();
    let mut r = Reader::new(bytes);

    ensure!(r.u32()? == MAGIC, "not a class file (bad magic)");
    r.skip(4)?; // minor and major version

    let utf8 = read_constant_pool(&mut r)?;

    r.skip(6)?; // access_flags, this_class, super_class
    let interface_count = r.u16()? as usize;
    r.skip(interface_count * 2)?;

    let field_count = r.u16()?;
    for _ in 0..field_count {
        r.skip(6)?; // access_flags, name_index, descriptor_index
        skip_attributes(&mut r)?;
    }

    let method_count = r.u16()?;
    for _ in 0..method_count {
        r.skip(6)?;
        let attr_count = r.u16()?;
        for _ in 0..attr_count {
            let name_index = r.u16()? as usize;
            let length = r.u32()? as usize;
            let end = r.checked_end(length)?;
            if utf8_at(&utf8, name_index) == Some("Code") {
                patch_code_attribute(&mut r, &utf8, &mut out, &mut patch)
                    .context("malformed Code attribute")?;
            }
            r.seek(end);
        }
    }

    // Class-level attributes carry no line numbers; nothing left to patch.
    Ok(out)
}

fn patch_code_attribute(
    r: &mut Reader,
    utf8: &[Option<&str>],
    out: &mut [u8],
    patch: &mut impl FnMut(u16) -> u16,
) -> Result<()> {
    r.skip(4)?; // max_stack, max_locals
    let code_length = r.u32()? as usize;
    r.skip(code_length)?;
    let handler_count = r.u16()? as usize;
    r.skip(handler_count * 8)?;

    let attr_count = r.u16()?;
    for _ in 0..attr_count {
        let name_index = r.u16()? as usize;
        let length = r.u32()? as usize;
        let end = r.checked_end(length)?;
        if utf8_at(utf8, name_index) == Some("LineNumberTable") {
            let entry_count = r.u16()?;
            for _ in 0..entry_count {
                r.skip(2)?; // start_pc
                let at = r.pos();
                let line = r.u16()?;
                out[at..at + 2].copy_from_slice(&patch(line).to_be_bytes());
            }
        }
        r.seek(end);
    }
    Ok(())
}

/// Collects Utf8 constants by pool index. Non-Utf8 entries are skipped by
/// their fixed sizes; wide (Long/Double) entries consume two slots.
fn read_constant_pool<'a>(r: &mut Reader<'a>) -> Result<Vec<Option<&'a str>>> {
    let count = r.u16()? as usize;
    let mut utf8 = vec![None; count];
    let mut index = 1;
    while index < count {
        let tag = r.u8()?;
        match tag {
            1 => {
                let length = r.u16()? as usize;
                let data = r.bytes(length)?;
                utf8[index] = std::str::from_utf8(data).ok();
            }
            7 | 8 | 16 | 19 | 20 => r.skip(2)?,
            15 => r.skip(3)?,
            3 | 4 | 9 | 10 | 11 | 12 | 17 | 18 => r.skip(4)?,
            5 | 6 => {
                r.skip(8)?;
                index += 1;
            }
            other => bail!("unknown constant pool tag {other} at offset {}", r.pos()),
        }
        index += 1;
    }
    Ok(utf8)
}

fn skip_attributes(r: &mut Reader) -> Result<()> {
    let count = r.u16()?;
    for _ in 0..count {
        r.skip(2)?; // attribute_name_index
        let length = r.u32()? as usize;
        r.skip(length)?;
    }
    Ok(())
}

fn utf8_at<'a>(utf8: &[Option<&'a str>], index: usize) -> Option<&'a str> {
    utf8.get(index).copied().flatten()
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// End offset of a region of `length` bytes starting at the cursor.
    fn checked_end(&self, length: usize) -> Result<usize> {
        let end = self.pos.checked_add(length).filter(|&end| end <= self.bytes.len());
        end.with_context(|| format!("truncated class file at offset {}", self.pos))
    }

    fn bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.checked_end(length)?;
        let data = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(data)
    }

    fn skip(&mut self, length: usize) -> Result<()> {
        self.pos = self.checked_end(length)?;
        Ok(())
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let data = self.bytes(2)?;
        Ok(u16::from_be_bytes([data[0], data[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let data = self.bytes(4)?;
        Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]]))
    }
}
