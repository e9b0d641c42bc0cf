//! Purchase-order document assembly.
//!
//! [`assemble_document`] turns an [`OrderDocumentSpec`] into PDF bytes. The
//! output depends only on its input: no clock, no random ids, so rendering
//! the same order twice yields identical files.
//!
//! Pages are laid out here with the Helvetica metrics in `metrics`, then
//! serialized by `pdf-writer`.

mod layout;
mod metrics;
mod pdf;

use layout::{Align, Cell, Flow, Row, Rule, Table, TextStyle, FRAME_WIDTH, MM, PAGE_HEIGHT, PAGE_WIDTH};
use metrics::{wrap, Font};
use pdf::{write_pdf, Canvas, Color, DocumentInfo};

use crate::format::{format_date, format_quantity};
use crate::order::{OrderDocumentSpec, OrderHeader, OrderItem};

const DARK_BLUE: Color = Color::hex(0x1f2a6d);
const HEADER_BLUE: Color = Color::hex(0x2b2f88);
const SLATE: Color = Color::hex(0x334155);
const WHITESMOKE: Color = Color::hex(0xf5f5f5);
const LAVENDER: Color = Color::hex(0xeef2ff);

const TITLE: TextStyle = TextStyle {
    font: Font::Bold,
    size: 18.0,
    leading: 22.0,
    color: DARK_BLUE,
};

const LABEL: TextStyle = TextStyle {
    font: Font::Bold,
    size: 10.0,
    leading: 13.0,
    color: DARK_BLUE,
};

const VALUE: TextStyle = TextStyle {
    font: Font::Regular,
    size: 10.0,
    leading: 13.0,
    color: SLATE,
};

const ITEM_HEADER: TextStyle = TextStyle {
    font: Font::Bold,
    size: 10.0,
    leading: 13.0,
    color: Color::WHITE,
};

const TITLE_SPACE_AFTER: f32 = 10.0;
const BLOCK_SPACE: f32 = 10.0;

/// Render the order as a PDF file.
pub fn assemble_document(spec: &OrderDocumentSpec) -> Vec<u8> {
    let pages = render_pages(spec);
    tracing::debug!(
        pages = pages.len(),
        ops = pages.iter().map(|p| p.ops().len()).sum::<usize>(),
        items = spec.items.len(),
        "assembled order document"
    );

    write_pdf(
        &pages,
        (PAGE_WIDTH, PAGE_HEIGHT),
        &DocumentInfo {
            title: "Purchase Order".into(),
            author: "Purchasing".into(),
        },
    )
}

/// Lay the order out into pages.
fn render_pages(spec: &OrderDocumentSpec) -> Vec<Canvas> {
    let header = &spec.header;
    let mut flow = Flow::new();

    let title = vec!["PURCHASE ORDER".to_string()];
    let info = info_table(header);
    flow.ensure(TITLE.leading + TITLE_SPACE_AFTER + info.height());
    flow.lines(&title, TITLE, Align::Center);
    flow.space(TITLE_SPACE_AFTER);
    info.draw(&mut flow);
    flow.space(BLOCK_SPACE);

    if let Some(notes) = header.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        flow.lines(&["Notes:".to_string()], LABEL, Align::Left);
        let lines: Vec<String> = notes
            .lines()
            .flat_map(|line| wrap(line, VALUE.font, VALUE.size, FRAME_WIDTH))
            .collect();
        flow.lines(&lines, VALUE, Align::Left);
        flow.space(BLOCK_SPACE);
    }

    items_table(&spec.items).draw(&mut flow);

    flow.finish()
}

fn or_dash(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

fn info_table(header: &OrderHeader) -> Table {
    let columns = vec![32.0 * MM, 63.0 * MM, 28.0 * MM, 55.0 * MM];
    let date = format_date(header.order_date);
    let pairs = [
        ("Order no.:", or_dash(header.order_number.as_deref()), "Date:", date.as_str()),
        (
            "Billing ID:",
            or_dash(header.billing_id.as_deref()),
            "Requester:",
            or_dash(Some(header.requester.as_str())),
        ),
        (
            "Supplier:",
            or_dash(Some(header.supplier.as_str())),
            "Destination (city):",
            or_dash(Some(header.destination.as_str())),
        ),
    ];

    let rows = pairs
        .iter()
        .map(|(label_a, value_a, label_b, value_b)| Row {
            cells: vec![
                Cell::new(label_a, LABEL, Align::Left, columns[0]),
                Cell::new(value_a, VALUE, Align::Left, columns[1]),
                Cell::new(label_b, LABEL, Align::Left, columns[2]),
                Cell::new(value_b, VALUE, Align::Left, columns[3]),
            ],
            background: WHITESMOKE,
        })
        .collect();

    Table {
        columns,
        header: None,
        rows,
        border: Rule {
            width: 0.6,
            color: Color::hex(0xcbd5e1),
        },
        grid: Rule {
            width: 0.4,
            color: Color::hex(0xe2e8f0),
        },
    }
}

fn items_table(items: &[OrderItem]) -> Table {
    let columns = vec![130.0 * MM, 35.0 * MM];

    let header = Row {
        cells: vec![
            Cell::new("Material", ITEM_HEADER, Align::Left, columns[0]),
            Cell::new("Quantity", ITEM_HEADER, Align::Right, columns[1]),
        ],
        background: HEADER_BLUE,
    };

    let rows = items
        .iter()
        .enumerate()
        .map(|(i, item)| Row {
            cells: vec![
                Cell::new(&item.material, VALUE, Align::Left, columns[0]),
                Cell::new(&format_quantity(item.quantity), VALUE, Align::Right, columns[1]),
            ],
            background: if i % 2 == 0 { WHITESMOKE } else { LAVENDER },
        })
        .collect();

    Table {
        columns,
        header: Some(header),
        rows,
        border: Rule {
            width: 0.8,
            color: Color::hex(0x94a3b8),
        },
        grid: Rule {
            width: 0.4,
            color: Color::hex(0xcbd5e1),
        },
    }
}
