use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

use etrace_types::Column;

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Header, filter bar, table and status bar, top to bottom
    pub fn main(area: Rect) -> (Rect, Rect, Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(3), // Filter bar
                Constraint::Min(3),    // Table
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        (chunks[0], chunks[1], chunks[2], chunks[3])
    }

    /// Table widths: a selection marker, then every column by weight
    pub fn column_widths() -> Vec<Constraint> {
        std::iter::once(Constraint::Length(1))
            .chain(Column::ALL.iter().map(|c| Constraint::Fill(c.width_weight())))
            .collect()
    }

    /// A `width` x `height` box centered in `area`, shrunk to fit
    pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(2));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_layout_partitions_area() {
        let (header, filters, table, status) = Layout::main(Rect::new(0, 0, 80, 24));
        assert_eq!(header.height, 1);
        assert_eq!(filters.height, 3);
        assert_eq!(status.height, 1);
        assert_eq!(table.height, 19);
        assert_eq!(status.y, 23);
    }

    #[test]
    fn test_centered_fits_inside() {
        let outer = Rect::new(0, 0, 40, 10);
        let inner = Layout::centered(outer, 100, 100);
        assert!(inner.width <= 36 && inner.height <= 8);
        assert_eq!(Layout::column_widths().len(), Column::COUNT + 1);
    }
}
