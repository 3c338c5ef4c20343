//! Minimal TrueType reader.
//!
//! Parses the sfnt table directory and the `head`, `maxp`, `hhea`,
//! `hmtx`, `cmap`, `loca` and `glyf` tables, enough to map codepoints to
//! glyphs and extract quadratic outlines. Hinting instructions are
//! skipped; `cvt ` is accepted and bounds-checked but not consumed.
//!
//! cmap subtables are selected in order of preference: format 12
//! (sparse 32-bit), format 4 (BMP segmented), format 0 (byte map).

use crate::error::{CanvasError, CanvasResult};

/// Recursion cap for composite glyph components.
const MAX_COMPOSITE_DEPTH: u32 = 32;

// Simple glyph flag bits
const ON_CURVE_POINT: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT_FLAG: u8 = 0x08;
const X_IS_SAME_OR_POSITIVE_SHORT: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE_SHORT: u8 = 0x20;

// Composite glyph flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Big-endian cursor over the font byte stream.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn truncated() -> CanvasError {
        CanvasError::InvalidFont("unexpected end of data")
    }

    fn u8(&mut self) -> CanvasResult<u8> {
        let v = *self.data.get(self.pos).ok_or_else(Reader::truncated)?;
        self.pos += 1;
        Ok(v)
    }

    fn u16(&mut self) -> CanvasResult<u16> {
        let bytes = self
            .data
            .get(self.pos..self.pos + 2)
            .ok_or_else(Reader::truncated)?;
        self.pos += 2;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn i16(&mut self) -> CanvasResult<i16> {
        Ok(self.u16()? as i16)
    }

    fn u32(&mut self) -> CanvasResult<u32> {
        let bytes = self
            .data
            .get(self.pos..self.pos + 4)
            .ok_or_else(Reader::truncated)?;
        self.pos += 4;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn skip(&mut self, n: usize) -> CanvasResult<()> {
        if self.pos + n > self.data.len() {
            return Err(Reader::truncated());
        }
        self.pos += n;
        Ok(())
    }
}

/// Byte range of one table within the font data.
#[derive(Debug, Clone, Copy, Default)]
struct TableRange {
    offset: usize,
    length: usize,
}

/// Receives glyph outline segments in font units.
pub(crate) trait OutlineSink {
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32);
    fn close(&mut self);
}

/// Character-to-glyph mapping, decoded from the preferred cmap subtable.
#[derive(Debug, Clone)]
enum Cmap {
    /// Format 0: byte map for codepoints 0..256.
    ByteMap(Vec<u8>),
    /// Format 4: BMP segments.
    Segmented {
        end_code: Vec<u16>,
        start_code: Vec<u16>,
        id_delta: Vec<i16>,
        id_range_offset: Vec<u16>,
        glyph_id_array: Vec<u16>,
    },
    /// Format 12: sparse groups of (start_char, end_char, start_glyph).
    Groups(Vec<(u32, u32, u32)>),
}

/// A parsed TrueType font.
///
/// Owns a copy of the font bytes; tables are referenced by byte range
/// and decoded on demand where that is cheap (loca/glyf/hmtx).
#[derive(Debug, Clone)]
pub(crate) struct Font {
    data: Vec<u8>,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    num_glyphs: u16,
    num_h_metrics: u16,
    index_to_loc_format: i16,
    cmap: Cmap,
    loca: TableRange,
    glyf: TableRange,
    hmtx: TableRange,
}

impl Font {
    /// Parse a TrueType byte stream.
    ///
    /// Rejects files whose referenced tables lie outside the slice and
    /// files missing any required table.
    pub fn parse(data: &[u8]) -> CanvasResult<Font> {
        let mut r = Reader::new(data);
        let sfnt_version = r.u32()?;
        if sfnt_version != 0x0001_0000 && sfnt_version != u32::from_be_bytes(*b"true") {
            return Err(CanvasError::InvalidFont("not a TrueType font"));
        }
        let num_tables = r.u16()?;
        let _search_range = r.u16()?;
        let _entry_selector = r.u16()?;
        let _range_shift = r.u16()?;

        let mut head = None;
        let mut maxp = None;
        let mut hhea = None;
        let mut hmtx = None;
        let mut cmap = None;
        let mut loca = None;
        let mut glyf = None;

        for _ in 0..num_tables {
            let mut tag = [0u8; 4];
            for byte in &mut tag {
                *byte = r.u8()?;
            }
            let _checksum = r.u32()?;
            let offset = r.u32()? as usize;
            let length = r.u32()? as usize;

            if offset.checked_add(length).map_or(true, |end| end > data.len()) {
                return Err(CanvasError::InvalidFont("table outside file bounds"));
            }
            let range = TableRange { offset, length };

            match &tag {
                b"head" => head = Some(range),
                b"maxp" => maxp = Some(range),
                b"hhea" => hhea = Some(range),
                b"hmtx" => hmtx = Some(range),
                b"cmap" => cmap = Some(range),
                b"loca" => loca = Some(range),
                b"glyf" => glyf = Some(range),
                b"cvt " => {} // optional, bounds already validated
                _ => {}
            }
        }

        let missing = || CanvasError::InvalidFont("missing required table");
        let head = head.ok_or_else(missing)?;
        let maxp = maxp.ok_or_else(missing)?;
        let hhea = hhea.ok_or_else(missing)?;
        let hmtx = hmtx.ok_or_else(missing)?;
        let cmap_range = cmap.ok_or_else(missing)?;
        let loca = loca.ok_or_else(missing)?;
        let glyf = glyf.ok_or_else(missing)?;

        // head: unitsPerEm at byte 18, indexToLocFormat at byte 50
        let head_data = &data[head.offset..head.offset + head.length];
        let mut r = Reader::new(head_data);
        r.skip(18)?;
        let units_per_em = r.u16()?;
        r.skip(30)?;
        let index_to_loc_format = r.i16()?;
        if units_per_em == 0 {
            return Err(CanvasError::InvalidFont("unitsPerEm is zero"));
        }
        if index_to_loc_format != 0 && index_to_loc_format != 1 {
            return Err(CanvasError::InvalidFont("unknown loca format"));
        }

        // maxp: numGlyphs at byte 4
        let maxp_data = &data[maxp.offset..maxp.offset + maxp.length];
        let mut r = Reader::new(maxp_data);
        r.skip(4)?;
        let num_glyphs = r.u16()?;

        // hhea: ascender at byte 4, numberOfHMetrics at byte 34
        let hhea_data = &data[hhea.offset..hhea.offset + hhea.length];
        let mut r = Reader::new(hhea_data);
        r.skip(4)?;
        let ascender = r.i16()?;
        let descender = r.i16()?;
        r.skip(26)?;
        let num_h_metrics = r.u16()?;
        if num_h_metrics == 0 {
            return Err(CanvasError::InvalidFont("no horizontal metrics"));
        }
        if hmtx.length < num_h_metrics as usize * 4 {
            return Err(CanvasError::InvalidFont("hmtx table too short"));
        }

        // loca needs one offset per glyph plus the terminator
        let loca_entry = if index_to_loc_format == 0 { 2 } else { 4 };
        if loca.length < (num_glyphs as usize + 1) * loca_entry {
            return Err(CanvasError::InvalidFont("loca table too short"));
        }

        let cmap = parse_cmap(&data[cmap_range.offset..cmap_range.offset + cmap_range.length])?;

        Ok(Font {
            data: data.to_vec(),
            units_per_em,
            ascender,
            descender,
            num_glyphs,
            num_h_metrics,
            index_to_loc_format,
            cmap,
            loca,
            glyf,
            hmtx,
        })
    }

    /// Map a codepoint to a glyph index; unmapped codepoints yield
    /// glyph 0 (.notdef).
    pub fn glyph_index(&self, codepoint: u32) -> u16 {
        let glyph = match &self.cmap {
            Cmap::ByteMap(map) => {
                if codepoint < 256 {
                    map.get(codepoint as usize).copied().unwrap_or(0) as u16
                } else {
                    0
                }
            }
            Cmap::Segmented {
                end_code,
                start_code,
                id_delta,
                id_range_offset,
                glyph_id_array,
            } => {
                if codepoint > 0xFFFF {
                    0
                } else {
                    lookup_format4(
                        codepoint as u16,
                        end_code,
                        start_code,
                        id_delta,
                        id_range_offset,
                        glyph_id_array,
                    )
                }
            }
            Cmap::Groups(groups) => {
                match groups.binary_search_by(|&(start, end, _)| {
                    if codepoint < start {
                        std::cmp::Ordering::Greater
                    } else if codepoint > end {
                        std::cmp::Ordering::Less
                    } else {
                        std::cmp::Ordering::Equal
                    }
                }) {
                    Ok(i) => {
                        let (start, _, start_glyph) = groups[i];
                        (start_glyph + (codepoint - start)) as u16
                    }
                    Err(_) => 0,
                }
            }
        };
        if glyph < self.num_glyphs {
            glyph
        } else {
            0
        }
    }

    /// Advance width of a glyph in font units.
    ///
    /// Glyphs past numberOfHMetrics replicate the last explicit advance.
    pub fn advance_width(&self, glyph: u16) -> u16 {
        let index = glyph.min(self.num_h_metrics - 1) as usize;
        let offset = self.hmtx.offset + index * 4;
        let bytes = &self.data[offset..offset + 2];
        u16::from_be_bytes([bytes[0], bytes[1]])
    }

    fn glyph_data(&self, glyph: u16) -> Option<&[u8]> {
        if glyph >= self.num_glyphs {
            return None;
        }
        let loca = &self.data[self.loca.offset..self.loca.offset + self.loca.length];
        let (start, end) = if self.index_to_loc_format == 0 {
            let i = glyph as usize * 2;
            let start = u16::from_be_bytes([loca[i], loca[i + 1]]) as usize * 2;
            let end = u16::from_be_bytes([loca[i + 2], loca[i + 3]]) as usize * 2;
            (start, end)
        } else {
            let i = glyph as usize * 4;
            let start = u32::from_be_bytes([loca[i], loca[i + 1], loca[i + 2], loca[i + 3]]) as usize;
            let end =
                u32::from_be_bytes([loca[i + 4], loca[i + 5], loca[i + 6], loca[i + 7]]) as usize;
            (start, end)
        };
        if start >= end || end > self.glyf.length {
            return None; // empty glyph
        }
        Some(&self.data[self.glyf.offset + start..self.glyf.offset + end])
    }

    /// Emit a glyph's outline into the sink, in font units with y up.
    pub fn outline_glyph(&self, glyph: u16, sink: &mut dyn OutlineSink) {
        let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        self.outline_glyph_transformed(glyph, identity, 0, sink);
    }

    fn outline_glyph_transformed(
        &self,
        glyph: u16,
        transform: [f32; 6],
        depth: u32,
        sink: &mut dyn OutlineSink,
    ) {
        if depth > MAX_COMPOSITE_DEPTH {
            log::warn!(target: "canvas", "composite glyph recursion too deep; truncating");
            return;
        }
        let data = match self.glyph_data(glyph) {
            Some(d) => d,
            None => return,
        };

        let mut r = Reader::new(data);
        let num_contours = match r.i16() {
            Ok(n) => n,
            Err(_) => return,
        };
        if r.skip(8).is_err() {
            return; // bounding box
        }

        if num_contours >= 0 {
            let _ = self.outline_simple(&mut r, num_contours as usize, transform, sink);
        } else {
            let _ = self.outline_composite(&mut r, transform, depth, sink);
        }
    }

    fn outline_simple(
        &self,
        r: &mut Reader<'_>,
        num_contours: usize,
        transform: [f32; 6],
        sink: &mut dyn OutlineSink,
    ) -> CanvasResult<()> {
        if num_contours == 0 {
            return Ok(());
        }

        let mut end_points = Vec::with_capacity(num_contours);
        for _ in 0..num_contours {
            end_points.push(r.u16()?);
        }
        let num_points = *end_points.last().unwrap() as usize + 1;

        // Skip hinting instructions
        let instruction_length = r.u16()? as usize;
        r.skip(instruction_length)?;

        // Flags, with repeat runs
        let mut flags = Vec::with_capacity(num_points);
        while flags.len() < num_points {
            let flag = r.u8()?;
            flags.push(flag);
            if flag & REPEAT_FLAG != 0 {
                let count = r.u8()? as usize;
                for _ in 0..count {
                    if flags.len() < num_points {
                        flags.push(flag);
                    }
                }
            }
        }

        // Delta-encoded coordinates
        let mut xs = Vec::with_capacity(num_points);
        let mut x: i32 = 0;
        for &flag in &flags {
            if flag & X_SHORT_VECTOR != 0 {
                let dx = r.u8()? as i32;
                x += if flag & X_IS_SAME_OR_POSITIVE_SHORT != 0 { dx } else { -dx };
            } else if flag & X_IS_SAME_OR_POSITIVE_SHORT == 0 {
                x += r.i16()? as i32;
            }
            xs.push(x);
        }
        let mut ys = Vec::with_capacity(num_points);
        let mut y: i32 = 0;
        for &flag in &flags {
            if flag & Y_SHORT_VECTOR != 0 {
                let dy = r.u8()? as i32;
                y += if flag & Y_IS_SAME_OR_POSITIVE_SHORT != 0 { dy } else { -dy };
            } else if flag & Y_IS_SAME_OR_POSITIVE_SHORT == 0 {
                y += r.i16()? as i32;
            }
            ys.push(y);
        }

        let apply = |x: i32, y: i32| -> (f32, f32) {
            let x = x as f32;
            let y = y as f32;
            (
                transform[0] * x + transform[2] * y + transform[4],
                transform[1] * x + transform[3] * y + transform[5],
            )
        };

        let mut start = 0usize;
        for &end in &end_points {
            let end = end as usize;
            if end < start || end >= xs.len() {
                return Err(CanvasError::InvalidFont("contour points out of range"));
            }
            emit_contour(
                &flags[start..=end],
                &xs[start..=end],
                &ys[start..=end],
                &apply,
                sink,
            );
            start = end + 1;
        }
        Ok(())
    }

    fn outline_composite(
        &self,
        r: &mut Reader<'_>,
        transform: [f32; 6],
        depth: u32,
        sink: &mut dyn OutlineSink,
    ) -> CanvasResult<()> {
        loop {
            let flags = r.u16()?;
            let component_glyph = r.u16()?;

            let (arg1, arg2) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
                (r.i16()? as f32, r.i16()? as f32)
            } else {
                (r.u8()? as i8 as f32, r.u8()? as i8 as f32)
            };
            // Point-matching arguments are point numbers, not offsets
            let (dx, dy) = if flags & ARGS_ARE_XY_VALUES != 0 {
                (arg1, arg2)
            } else {
                (0.0, 0.0)
            };

            // Component 2x2, in F2Dot14
            let (mut a, mut b, mut c, mut d) = (1.0f32, 0.0f32, 0.0f32, 1.0f32);
            if flags & WE_HAVE_A_SCALE != 0 {
                let scale = r.i16()? as f32 / 16384.0;
                a = scale;
                d = scale;
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                a = r.i16()? as f32 / 16384.0;
                d = r.i16()? as f32 / 16384.0;
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                a = r.i16()? as f32 / 16384.0;
                b = r.i16()? as f32 / 16384.0;
                c = r.i16()? as f32 / 16384.0;
                d = r.i16()? as f32 / 16384.0;
            }

            // Child transform composed under the parent's
            let child = [
                transform[0] * a + transform[2] * b,
                transform[1] * a + transform[3] * b,
                transform[0] * c + transform[2] * d,
                transform[1] * c + transform[3] * d,
                transform[0] * dx + transform[2] * dy + transform[4],
                transform[1] * dx + transform[3] * dy + transform[5],
            ];
            self.outline_glyph_transformed(component_glyph, child, depth + 1, sink);

            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }
        Ok(())
    }
}

/// Emit one contour of a simple glyph, resolving off-curve runs into
/// quadratic segments with implied on-curve midpoints.
fn emit_contour(
    flags: &[u8],
    xs: &[i32],
    ys: &[i32],
    apply: &dyn Fn(i32, i32) -> (f32, f32),
    sink: &mut dyn OutlineSink,
) {
    let n = flags.len();
    if n == 0 {
        return;
    }

    let on_curve = |i: usize| flags[i % n] & ON_CURVE_POINT != 0;
    let point = |i: usize| (xs[i % n], ys[i % n]);
    let midpoint = |i: usize, j: usize| {
        let (xi, yi) = point(i);
        let (xj, yj) = point(j);
        ((xi + xj) / 2, (yi + yj) / 2)
    };

    // Find a starting on-curve point, or synthesize one between two
    // off-curve points.
    let start_index = (0..n).find(|&i| on_curve(i));
    let (start_x, start_y) = match start_index {
        Some(i) => point(i),
        None => midpoint(0, 1),
    };
    let first = start_index.unwrap_or(0);

    let (sx, sy) = apply(start_x, start_y);
    sink.move_to(sx, sy);

    // Walk the remaining points; with a synthesized start every original
    // point is still pending.
    let mut pending_control: Option<(i32, i32)> = None;
    let total = if start_index.is_some() { n - 1 } else { n };
    for step in 1..=total {
        let i = first + step;
        let (px, py) = point(i);
        if on_curve(i) {
            match pending_control.take() {
                None => {
                    let (x, y) = apply(px, py);
                    sink.line_to(x, y);
                }
                Some((cx, cy)) => {
                    let (cx, cy) = apply(cx, cy);
                    let (x, y) = apply(px, py);
                    sink.quad_to(cx, cy, x, y);
                }
            }
        } else {
            if let Some((cx, cy)) = pending_control {
                // Two consecutive off-curve points imply an on-curve
                // midpoint between them.
                let mx = (cx + px) / 2;
                let my = (cy + py) / 2;
                let (acx, acy) = apply(cx, cy);
                let (amx, amy) = apply(mx, my);
                sink.quad_to(acx, acy, amx, amy);
            }
            pending_control = Some((px, py));
        }
    }

    // Close back to the start point
    if let Some((cx, cy)) = pending_control {
        let (acx, acy) = apply(cx, cy);
        sink.quad_to(acx, acy, sx, sy);
    } else {
        sink.line_to(sx, sy);
    }
    sink.close();
}

fn lookup_format4(
    codepoint: u16,
    end_code: &[u16],
    start_code: &[u16],
    id_delta: &[i16],
    id_range_offset: &[u16],
    glyph_id_array: &[u16],
) -> u16 {
    let seg_count = end_code.len();

    // Binary search for the first segment with end_code >= codepoint
    let mut lo = 0usize;
    let mut hi = seg_count;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if end_code[mid] < codepoint {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo >= seg_count || start_code[lo] > codepoint {
        return 0;
    }

    if id_range_offset[lo] == 0 {
        return (codepoint as i32 + id_delta[lo] as i32) as u16;
    }

    // id_range_offset is in bytes relative to its own position within
    // the id_range_offset array; the glyph id array follows it.
    let index = id_range_offset[lo] as usize / 2 + (codepoint - start_code[lo]) as usize;
    let array_index = match index.checked_sub(seg_count - lo) {
        Some(i) => i,
        None => return 0,
    };
    match glyph_id_array.get(array_index) {
        Some(&0) | None => 0,
        Some(&gid) => (gid as i32 + id_delta[lo] as i32) as u16,
    }
}

/// Select and decode the preferred cmap subtable.
fn parse_cmap(data: &[u8]) -> CanvasResult<Cmap> {
    let mut r = Reader::new(data);
    let _version = r.u16()?;
    let num_subtables = r.u16()?;

    let mut best: Option<(u8, usize)> = None; // (priority, offset); lower wins
    for _ in 0..num_subtables {
        let _platform_id = r.u16()?;
        let _encoding_id = r.u16()?;
        let offset = r.u32()? as usize;
        if offset + 2 > data.len() {
            continue;
        }
        let format = u16::from_be_bytes([data[offset], data[offset + 1]]);
        let priority = match format {
            12 => 0,
            4 => 1,
            0 => 2,
            _ => continue,
        };
        if best.map_or(true, |(p, _)| priority < p) {
            best = Some((priority, offset));
        }
    }

    let (_, offset) = best.ok_or(CanvasError::InvalidFont("no usable cmap subtable"))?;
    let sub = &data[offset..];
    let mut r = Reader::new(sub);
    let format = r.u16()?;

    match format {
        0 => {
            let _length = r.u16()?;
            let _language = r.u16()?;
            let mut map = Vec::with_capacity(256);
            for _ in 0..256 {
                map.push(r.u8()?);
            }
            Ok(Cmap::ByteMap(map))
        }
        4 => {
            let length = r.u16()? as usize;
            let _language = r.u16()?;
            let seg_count = r.u16()? as usize / 2;
            let _search_range = r.u16()?;
            let _entry_selector = r.u16()?;
            let _range_shift = r.u16()?;

            let mut end_code = Vec::with_capacity(seg_count);
            for _ in 0..seg_count {
                end_code.push(r.u16()?);
            }
            let _reserved = r.u16()?;
            let mut start_code = Vec::with_capacity(seg_count);
            for _ in 0..seg_count {
                start_code.push(r.u16()?);
            }
            let mut id_delta = Vec::with_capacity(seg_count);
            for _ in 0..seg_count {
                id_delta.push(r.i16()?);
            }
            let mut id_range_offset = Vec::with_capacity(seg_count);
            for _ in 0..seg_count {
                id_range_offset.push(r.u16()?);
            }

            let remaining = length.min(sub.len()).saturating_sub(r.pos) / 2;
            let mut glyph_id_array = Vec::with_capacity(remaining);
            for _ in 0..remaining {
                glyph_id_array.push(r.u16()?);
            }

            Ok(Cmap::Segmented {
                end_code,
                start_code,
                id_delta,
                id_range_offset,
                glyph_id_array,
            })
        }
        12 => {
            let _reserved = r.u16()?;
            let _length = r.u32()?;
            let _language = r.u32()?;
            let num_groups = r.u32()? as usize;
            let mut groups = Vec::with_capacity(num_groups.min(1 << 20));
            for _ in 0..num_groups {
                let start = r.u32()?;
                let end = r.u32()?;
                let start_glyph = r.u32()?;
                groups.push((start, end, start_glyph));
            }
            Ok(Cmap::Groups(groups))
        }
        _ => Err(CanvasError::InvalidFont("unsupported cmap format")),
    }
}

/// Build a minimal two-glyph font for tests: glyph 0 empty, glyph 1 a
/// triangle (0,0) (500,0) (250,500), with 'A' mapped to glyph 1.
#[cfg(test)]
pub(crate) fn build_test_font() -> Vec<u8> {
    tests::build_test_font_bytes()
}
