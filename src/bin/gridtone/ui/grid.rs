//! Grid widget - the playing surface.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use gridtone::sequencing::grid::Cell;

/// Render the note grid: rows top-to-bottom in visual order, active cells
/// filled, cursor highlighted.
pub fn render_grid(frame: &mut Frame, area: Rect, grid_size: u8, active: &[Cell], cursor: Cell) {
    let block = Block::default()
        .title(" grid (space: toggle, a: arp) ")
        .borders(Borders::ALL);

    let mut lines = Vec::with_capacity(grid_size as usize);
    for y in 0..grid_size {
        let mut spans = Vec::with_capacity(grid_size as usize);
        for x in 0..grid_size {
            let cell = Cell::new(x, y);
            let is_active = active.contains(&cell);
            let is_cursor = cell == cursor;

            let symbol = if is_active { "● " } else { "· " };
            let mut style = if is_active {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if is_cursor {
                style = style.bg(Color::Blue).add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(symbol, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
