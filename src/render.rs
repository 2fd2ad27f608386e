//! PDF output for seat grids.
//!
//! One A4 page per classroom: a bold centered title followed by the seat table
//! (grey header row, full grid, centered text). A table taller than the page
//! continues on the next page with the header repeated. Only the standard
//! Helvetica fonts are used, so text is limited to WinAnsi.

use crate::error::PlanError;
use crate::layout::{SeatGrid, Variant};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str, TextStr};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 72.0;
const TITLE_SIZE: f32 = 18.0;
const TITLE_BLOCK: f32 = 40.0;
const CELL_FONT_SIZE: f32 = 10.0;
const ROW_HEIGHT: f32 = 18.0;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomPage {
    pub classroom: String,
    pub grid: SeatGrid,
}

fn column_widths(variant: Variant) -> &'static [f32] {
    match variant {
        Variant::Seating => &[40.0, 80.0, 40.0, 80.0],
        Variant::Signature => &[35.0, 75.0, 110.0, 35.0, 75.0, 110.0],
    }
}

/// Renders all classrooms into one document, in order.
pub fn render_document(pages: &[ClassroomPage], doc_title: &str) -> Result<Vec<u8>, PlanError> {
    if pages.is_empty() {
        return Err(PlanError::render("nothing to render: no classrooms"));
    }

    let mut contents = Vec::new();
    for page in pages {
        let grid = &page.grid;
        if let Some((i, row)) = grid
            .rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != grid.width())
        {
            return Err(PlanError::render(format!(
                "{}: row {} has {} cells, expected {}",
                page.classroom,
                i + 1,
                row.len(),
                grid.width()
            )));
        }
        let widths = column_widths(grid.variant);
        contents.extend(classroom_contents(&page.classroom, grid, widths));
    }

    Ok(assemble(contents, doc_title))
}

fn classroom_contents(classroom: &str, grid: &SeatGrid, widths: &[f32]) -> Vec<Content> {
    let header = grid.header();
    let mut out = Vec::new();
    let mut remaining = &grid.rows[..];
    let mut first = true;
    loop {
        let mut content = Content::new();
        let mut top = PAGE_HEIGHT - MARGIN;
        if first {
            draw_title(&mut content, &grid.variant.title(classroom), top);
            top -= TITLE_BLOCK;
        }
        let fits = (((top - MARGIN) / ROW_HEIGHT) as usize).saturating_sub(1).max(1);
        let take = remaining.len().min(fits);
        draw_table(&mut content, widths, &header, &remaining[..take], top);
        out.push(content);

        remaining = &remaining[take..];
        first = false;
        if remaining.is_empty() {
            break;
        }
    }
    out
}

fn draw_title(content: &mut Content, title: &str, top: f32) {
    let bytes = to_winansi(title);
    let x = (PAGE_WIDTH - text_width(&bytes, true, TITLE_SIZE)) / 2.0;
    content
        .set_fill_gray(0.0)
        .begin_text()
        .set_font(BOLD, TITLE_SIZE)
        .next_line(x, top - TITLE_SIZE)
        .show(Str(&bytes))
        .end_text();
}

fn draw_table(content: &mut Content, widths: &[f32], header: &[&str], rows: &[Vec<String>], top: f32) {
    let table_width: f32 = widths.iter().sum();
    let left = (PAGE_WIDTH - table_width) / 2.0;
    let line_count = rows.len() + 1;
    let bottom = top - ROW_HEIGHT * line_count as f32;

    content
        .set_fill_gray(0.5)
        .rect(left, top - ROW_HEIGHT, table_width, ROW_HEIGHT)
        .fill_nonzero();

    content.set_fill_gray(0.96);
    draw_row(content, widths, left, top, header.iter().copied(), true);
    content.set_fill_gray(0.0);
    for (i, row) in rows.iter().enumerate() {
        let row_top = top - ROW_HEIGHT * (i + 1) as f32;
        draw_row(content, widths, left, row_top, row.iter().map(String::as_str), false);
    }

    content.set_stroke_gray(0.0).set_line_width(1.0);
    for i in 0..=line_count {
        let y = top - ROW_HEIGHT * i as f32;
        content.move_to(left, y).line_to(left + table_width, y);
    }
    let mut x = left;
    content.move_to(x, top).line_to(x, bottom);
    for w in widths {
        x += w;
        content.move_to(x, top).line_to(x, bottom);
    }
    content.stroke();
}

fn draw_row<'a>(
    content: &mut Content,
    widths: &[f32],
    left: f32,
    row_top: f32,
    cells: impl Iterator<Item = &'a str>,
    bold: bool,
) {
    let font = if bold { BOLD } else { REGULAR };
    let baseline = row_top - ROW_HEIGHT / 2.0 - CELL_FONT_SIZE * 0.35;
    let mut x = left;
    for (w, text) in widths.iter().zip(cells) {
        if !text.is_empty() {
            let bytes = to_winansi(text);
            let tx = x + (w - text_width(&bytes, bold, CELL_FONT_SIZE)) / 2.0;
            content
                .begin_text()
                .set_font(font, CELL_FONT_SIZE)
                .next_line(tx, baseline)
                .show(Str(&bytes))
                .end_text();
        }
        x += w;
    }
}

fn assemble(contents: Vec<Content>, doc_title: &str) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let regular_id = Ref::new(3);
    let bold_id = Ref::new(4);
    let info_id = Ref::new(5);
    let page_ids: Vec<Ref> = (0..contents.len())
        .map(|i| Ref::new(6 + 2 * i as i32))
        .collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.document_info(info_id)
        .title(TextStr(doc_title))
        .producer(TextStr(concat!("seatingd ", env!("CARGO_PKG_VERSION"))));

    for (content, page_id) in contents.into_iter().zip(page_ids.iter().copied()) {
        let content_id = Ref::new(page_id.get() + 1);
        {
            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
                .parent(pages_id)
                .contents(content_id);
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            fonts.pair(REGULAR, regular_id);
            fonts.pair(BOLD, bold_id);
        }
        pdf.stream(content_id, &content.finish());
    }

    pdf.finish()
}

/// WinAnsi bytes. Turkish letters outside the code page fold to ASCII, anything else becomes `?`.
pub fn to_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            'Š' => 0x8a,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            'š' => 0x9a,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            'ı' => b'i',
            'İ' => b'I',
            'ş' => b's',
            'Ş' => b'S',
            'ğ' => b'g',
            'Ğ' => b'G',
            _ => b'?',
        })
        .collect()
}

// AFM advance widths (1/1000 em) for 0x20..=0x7e.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611, // 'A'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333,
    500, 278, 556, 500, 722, 500, 500, 500, // 'a'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722,
    667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389,
    556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

fn text_width(bytes: &[u8], bold: bool, size: f32) -> f32 {
    let table = if bold {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    let units: u32 = bytes
        .iter()
        .map(|&b| match b {
            0x20..=0x7e => u32::from(table[usize::from(b - 0x20)]),
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}
