use crate::core::state::App;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, TitleBar, Welcome, input_box};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Length(1), Min(0), Length(input_box::HEIGHT)]);
    let [title_area, main_area, input_area] = layout.areas(frame.area());

    // Main area first: the title bar needs the scroll position it settles on
    let starters: &[String] = if app.show_starters { &app.starters } else { &[] };
    MessageList::new(
        &mut tui.message_list,
        &app.transcript,
        &tui.reveal,
        spinner_frame,
    )
    .header(Welcome::new(starters))
    .render(frame, main_area);
    let has_unseen_content = tui.message_list.has_content_below();

    TitleBar::new(
        app.connection,
        &app.endpoint,
        &app.status_message,
        has_unseen_content,
    )
    .render(frame, title_area);

    tui.input_box.render(frame, input_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::{Action, update};
    use crate::core::validation::Query;
    use crate::test_support::{open_app, test_app};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(app: &App, tui: &mut TuiState) -> String {
        let backend = TestBackend::new(100, 50);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_draw_ui_shows_welcome_before_first_submit() {
        let app = test_app();
        let mut tui = TuiState::new(0);
        let text = draw(&app, &mut tui);
        assert!(text.contains("Epoch"));
        assert!(text.contains("connecting"));
        assert!(text.contains("Discover the power of informed decision-making"));
        assert!(text.contains("1. What is AAPL doing today?"));
        assert!(text.contains("Ask Epoch"));
    }

    #[test]
    fn test_draw_ui_shows_transcript_after_submit() {
        let mut app = open_app();
        update(
            &mut app,
            Action::Submit(Query::parse("What is AAPL doing today?").unwrap()),
        );
        let mut tui = TuiState::new(0);
        let text = draw(&app, &mut tui);
        // Banner stays at the top of the transcript; the starters are gone
        assert!(text.contains("Discover the power of informed decision-making"));
        assert!(!text.contains("1. What is AAPL doing today?"));
        assert!(!text.contains("Try one of these"));
        assert!(text.contains("online"));
        assert!(text.contains("Analyzing..."));
        assert!(text.contains("What is AAPL doing today?"));
        assert!(text.contains("Analyzing stocks for you!"));
    }
}
