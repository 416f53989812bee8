//! # TUI Components
//!
//! All UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as parameters:
//! - `TitleBar`: connection state, endpoint and status message
//! - `MessageView`: a single transcript entry
//! - `Welcome`: banner heading the transcript, with starters until the first query
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: query field with validation
//! - `MessageList`: scrollable transcript with layout caching and scroll-follow
//!
//! ### Props-Based Data Flow
//!
//! Components receive external data as props (struct fields), not by reading
//! `App` directly. The run loop copies what each needs every frame, e.g.
//! `input_box.disabled = app.is_loading()`.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── message.rs       (Single message renderer)
//! ├── message_list.rs  (Scrollable message container)
//! ├── welcome.rs       (Banner and starters)
//! └── input_box.rs     (Query input)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod message;
pub use input_box::{InputBox, InputEvent};
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
pub mod welcome;
pub use welcome::Welcome;
