use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Row, Table, TableState},
};

use crate::model::{Model, UIData};
use crate::table::ColumnView;

pub const STATUSLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const BLOCK_BORDER_HEIGHT: usize = 2;
// Five lines of pretty printed order plus the block border
pub const DETAIL_HEIGHT: usize = 7;

pub const LOADING_TEXT: &str = "Laden...";
pub const DETAIL_TITLE: &str = " Geselecteerde bestelling: ";

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [table_area, detail_area, status_area] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(uidata.layout.detail_height as u16),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.render_table(uidata, frame, table_area);
        if let Some(detail) = &uidata.detail {
            Self::render_detail(detail, frame, detail_area);
        }
        Self::render_statusline(uidata, frame, status_area);

        if uidata.show_popup {
            Self::render_popup(&uidata.popup_message, frame);
        }
    }

    fn render_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let title = Line::from(format!(" {} ", uidata.name).bold());
        let instructions = Line::from(vec![
            " Select ".into(),
            "<Enter>".blue().bold(),
            " Sort ".into(),
            "<s/S>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        if uidata.is_loading && uidata.nrows == 0 {
            frame.render_widget(Paragraph::new(LOADING_TEXT).centered().block(block), area);
            return;
        }

        let header = Row::new(uidata.table.iter().map(|c| c.name.clone())).bold();
        let widths: Vec<Constraint> = uidata
            .table
            .iter()
            .map(|c| Constraint::Length(c.width as u16))
            .collect();
        let table = Table::new(Self::build_rows(&uidata.table), widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::new().reversed());

        let selected = if uidata.nrows == 0 {
            None
        } else {
            Some(uidata.selected_row)
        };
        self.table_state.select(selected);
        // Rows arrive already windowed by the model
        *self.table_state.offset_mut() = 0;
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn build_rows(columns: &[ColumnView]) -> Vec<Row<'static>> {
        let nrows = columns.iter().map(|c| c.data.len()).min().unwrap_or(0);
        (0..nrows)
            .map(|ridx| Row::new(columns.iter().map(|c| c.data[ridx].clone())))
            .collect()
    }

    fn render_detail(detail: &str, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(Line::from(DETAIL_TITLE.bold()));
        frame.render_widget(Paragraph::new(Text::from(detail.to_string())).block(block), area);
    }

    fn render_statusline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [message_area, position_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(36)]).areas(area);

        let row = if uidata.nrows == 0 {
            0
        } else {
            uidata.abs_selected_row + 1
        };
        let position = format!(
            "{}Pagina {}/{}  Rij {}/{} ({}) ",
            if uidata.is_fetching { "↻ " } else { "" },
            uidata.page_index + 1,
            uidata.page_count.max(1),
            row,
            uidata.nrows,
            uidata.total,
        );
        frame.render_widget(Paragraph::new(uidata.status_message.as_str()).yellow(), message_area);
        frame.render_widget(Paragraph::new(position).right_aligned(), position_area);
    }

    fn render_popup(message: &str, frame: &mut Frame) {
        let width = message.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let height = message.lines().count() as u16 + 2;
        let area = Self::centered(frame.area(), width, height);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::ROUNDED);
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(message).block(block), area);
    }

    fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let [area] = Layout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        area
    }
}
