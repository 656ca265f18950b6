use umya_spreadsheet::{HorizontalAlignmentValues, Style, VerticalAlignmentValues, Worksheet};

/// Apply the write policy to one cell: alignment is always forced to
/// left / center / no-wrap, and when `preserve` is set the font, fill, and
/// borders are copied whole from the reference style. Alignment is never
/// part of the copy.
pub fn apply_cell_policy(
    sheet: &mut Worksheet,
    col: u32,
    row: u32,
    reference: Option<&Style>,
    preserve: bool,
) {
    let style = sheet.get_style_mut((col, row));

    if preserve && let Some(reference) = reference {
        if let Some(font) = reference.get_font() {
            style.set_font(font.clone());
        }
        if let Some(fill) = reference.get_fill() {
            style.set_fill(fill.clone());
        }
        if let Some(borders) = reference.get_borders() {
            style.set_borders(borders.clone());
        }
    }

    force_alignment(style);
}

/// Re-apply a cell's own prior style around a text write, keeping the number
/// format as well; alignment is still forced afterwards.
pub fn restore_cell_style(sheet: &mut Worksheet, col: u32, row: u32, prior: &Style, preserve: bool) {
    let style = sheet.get_style_mut((col, row));

    if preserve {
        if let Some(font) = prior.get_font() {
            style.set_font(font.clone());
        }
        if let Some(fill) = prior.get_fill() {
            style.set_fill(fill.clone());
        }
        if let Some(borders) = prior.get_borders() {
            style.set_borders(borders.clone());
        }
        let format_code = prior.get_number_format().map(|nf| nf.get_format_code().to_string());
        if let Some(code) = format_code {
            style.get_number_format_mut().set_format_code(code);
        }
    }

    force_alignment(style);
}

fn force_alignment(style: &mut Style) {
    let alignment = style.get_alignment_mut();
    alignment.set_horizontal(HorizontalAlignmentValues::Left);
    alignment.set_vertical(VerticalAlignmentValues::Center);
    alignment.set_wrap_text(false);
}

/// Snapshot of a cell's style, if it has one.
pub fn style_snapshot(sheet: &Worksheet, col: u32, row: u32) -> Option<Style> {
    sheet.get_cell((col, row)).map(|cell| cell.get_style().clone())
}
