use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use hotspot_core::ConnectScreen;
use tokio::task::JoinHandle;
use tui_input::{Input, InputRequest};

const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Ssid,
    Password,
    Connect,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Ssid => Focus::Password,
            Focus::Password => Focus::Connect,
            Focus::Connect => Focus::Ssid,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Ssid => Focus::Connect,
            Focus::Password => Focus::Ssid,
            Focus::Connect => Focus::Password,
        }
    }
}

pub struct App {
    pub ssid: Input,
    pub password: Input,
    pub focus: Focus,
    pub should_quit: bool,
    spinner_frame: usize,
    screen: ConnectScreen,
}

impl App {
    pub fn new(screen: ConnectScreen) -> Self {
        Self {
            ssid: Input::default(),
            password: Input::default(),
            focus: Focus::Ssid,
            should_quit: false,
            spinner_frame: 0,
            screen,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.screen.is_busy()
    }

    pub fn info_label(&self) -> Option<String> {
        self.screen.info_label()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn on_tick(&mut self) {
        if self.is_busy() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub fn press_connect(&mut self) -> Option<JoinHandle<()>> {
        self.screen
            .connect_button_tapped(self.ssid.value(), self.password.value())
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.previous(),
            KeyCode::Enter => match self.focus {
                Focus::Ssid => self.focus = Focus::Password,
                Focus::Password | Focus::Connect => {
                    // Completion is applied by the screen itself
                    let _ = self.press_connect();
                }
            },
            _ => {
                if let Some(request) = input_request(key) {
                    match self.focus {
                        Focus::Ssid => {
                            self.ssid.handle(request);
                        }
                        Focus::Password => {
                            self.password.handle(request);
                        }
                        Focus::Connect => {}
                    }
                }
            }
        }
    }
}

fn input_request(key: KeyEvent) -> Option<InputRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
        KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
        KeyCode::Char('a') if ctrl => Some(InputRequest::GoToStart),
        KeyCode::Char('e') if ctrl => Some(InputRequest::GoToEnd),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(InputRequest::InsertChar(c)),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_core::platform::MockPlatform;
    use std::sync::Arc;

    fn app_with(platform: &Arc<MockPlatform>) -> App {
        App::new(ConnectScreen::new(platform.clone(), platform.clone()))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn focus_cycles_both_ways() {
        let platform = Arc::new(MockPlatform::new());
        let mut app = app_with(&platform);

        assert_eq!(app.focus, Focus::Ssid);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Password);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.focus, Focus::Connect);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Ssid);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Connect);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.focus, Focus::Password);
    }

    #[tokio::test]
    async fn typing_edits_only_the_focused_field() {
        let platform = Arc::new(MockPlatform::new());
        let mut app = app_with(&platform);

        type_text(&mut app, "HomeNex");
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "t");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "password1");

        assert_eq!(app.ssid.value(), "HomeNet");
        assert_eq!(app.password.value(), "password1");

        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "ignored");
        assert_eq!(app.ssid.value(), "HomeNet");
        assert_eq!(app.password.value(), "password1");
    }

    #[tokio::test]
    async fn enter_on_password_presses_connect() {
        let platform = Arc::new(MockPlatform::new());
        let mut app = app_with(&platform);

        type_text(&mut app, "HomeNet");
        press(&mut app, KeyCode::Enter);
        assert!(platform.applied().is_empty());

        type_text(&mut app, "password1");
        press(&mut app, KeyCode::Enter);
        assert!(app.is_busy());

        // Let the detached completion run
        while app.is_busy() {
            tokio::task::yield_now().await;
        }
        let applied = platform.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].ssid, "HomeNet");
        assert_eq!(applied[0].passphrase, "password1");
    }

    #[tokio::test]
    async fn connect_with_empty_fields_does_nothing() {
        let platform = Arc::new(MockPlatform::new());
        let mut app = app_with(&platform);

        app.focus = Focus::Connect;
        press(&mut app, KeyCode::Enter);

        assert!(!app.is_busy());
        assert!(platform.applied().is_empty());
    }

    #[tokio::test]
    async fn successful_press_fills_the_info_label() {
        let platform = Arc::new(MockPlatform::new());
        let mut app = app_with(&platform);

        type_text(&mut app, "MyHomeWiFi");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "password1");

        app.press_connect().unwrap().await.unwrap();
        assert_eq!(
            app.info_label().as_deref(),
            Some("SSID MyHomeWiFi\nBSSID 02:00:00:00:00:01")
        );
    }

    #[tokio::test]
    async fn escape_and_ctrl_c_quit() {
        let platform = Arc::new(MockPlatform::new());
        let mut app = app_with(&platform);
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);

        let mut app = app_with(&platform);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert_eq!(app.ssid.value(), "");
    }

    #[tokio::test]
    async fn spinner_only_turns_while_busy() {
        let platform = Arc::new(MockPlatform::new());
        let mut app = app_with(&platform);
        let idle = app.spinner();
        app.on_tick();
        assert_eq!(app.spinner(), idle);
    }
}
