//! Word-by-word reveal of bot replies.
//!
//! A resolved reply is shown a few words per frame until complete. Each step
//! grows the message, so the message list treats it like any other content
//! change for layout and scroll-follow.

use std::collections::{HashMap, HashSet};

use crate::core::message::{Message, MessageId, Role, Transcript};

pub struct Reveal {
    words_per_frame: usize,
    /// Words shown so far, per reply still being revealed.
    progress: HashMap<MessageId, usize>,
    /// Replies that have been shown in full.
    done: HashSet<MessageId>,
}

impl Reveal {
    /// `words_per_frame == 0` shows every reply instantly.
    pub fn new(words_per_frame: usize) -> Self {
        Self {
            words_per_frame,
            progress: HashMap::new(),
            done: HashSet::new(),
        }
    }

    /// True while some tracked reply is still being revealed.
    pub fn is_animating(&self) -> bool {
        !self.progress.is_empty()
    }

    /// Registers newly resolved replies without revealing anything yet, so
    /// the next `tick` shows exactly one step. Returns true if any were added.
    pub fn track(&mut self, transcript: &Transcript) -> bool {
        let mut added = false;
        for message in transcript.messages() {
            if !self.is_unseen_reply(message) {
                continue;
            }
            if self.words_per_frame == 0 {
                self.done.insert(message.id);
            } else {
                self.progress.insert(message.id, 0);
            }
            added = true;
        }
        added
    }

    fn is_unseen_reply(&self, message: &Message) -> bool {
        message.role == Role::Bot
            && !message.loading
            && message.text.is_some()
            && !self.done.contains(&message.id)
            && !self.progress.contains_key(&message.id)
    }

    /// Advances every resolved reply by one step. Returns true if any
    /// visible text changed.
    pub fn tick(&mut self, transcript: &Transcript) -> bool {
        let mut changed = false;
        for message in transcript.messages() {
            if message.role != Role::Bot || message.loading || self.done.contains(&message.id) {
                continue;
            }
            let Some(text) = message.text.as_deref() else {
                continue;
            };
            let total = word_count(text);
            if self.words_per_frame == 0 {
                self.done.insert(message.id);
                changed = true;
                continue;
            }

            let shown = self.progress.entry(message.id).or_insert(0);
            *shown = (*shown + self.words_per_frame).min(total);
            changed = true;
            if *shown >= total {
                self.progress.remove(&message.id);
                self.done.insert(message.id);
            }
        }
        changed
    }

    /// The part of `message`'s text currently on screen.
    pub fn visible<'a>(&self, message: &'a Message) -> &'a str {
        let text = message.text.as_deref().unwrap_or("");
        if self.done.contains(&message.id) {
            return text;
        }
        match self.progress.get(&message.id) {
            Some(&shown) => prefix_words(text, shown),
            None => "",
        }
    }

    /// Words shown for a message, used as part of its layout key.
    pub fn shown_words(&self, id: MessageId) -> Option<usize> {
        if self.done.contains(&id) {
            None
        } else {
            Some(self.progress.get(&id).copied().unwrap_or(0))
        }
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Slice of `text` up to and including its `n`th whitespace-separated word.
fn prefix_words(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let mut seen = 0;
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                seen += 1;
                if seen == n {
                    return &text[..i];
                }
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }
    text
}
