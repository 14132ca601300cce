//! Scripted prompter for tests and non-interactive use.
//!
//! Answers are queued per dialog kind and handed out in order.  A dialog
//! whose queue is empty is treated as dismissed.

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::workflow::{Confirmation, Prompter, UrlForm};

#[derive(Default)]
struct Script {
    names: VecDeque<Option<String>>,
    forms: VecDeque<Option<UrlForm>>,
    confirmations: VecDeque<bool>,
    files: VecDeque<Option<PathBuf>>,
    asked: Vec<Confirmation>,
}

/// A [`Prompter`] that replays queued answers.
#[derive(Default)]
pub struct ScriptedPrompter {
    script: Mutex<Script>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an answer for the category-name dialog.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.script.get_mut().names.push_back(Some(name.into()));
        self
    }

    /// Queues an answer for the URL dialog.
    pub fn url(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        let form = UrlForm {
            name: name.into(),
            url: url.into(),
        };
        self.script.get_mut().forms.push_back(Some(form));
        self
    }

    /// Queues a "yes" for the next confirmation.
    pub fn accept(self) -> Self {
        self.answer(true)
    }

    /// Queues a "no" for the next confirmation.
    pub fn decline(self) -> Self {
        self.answer(false)
    }

    fn answer(mut self, answer: bool) -> Self {
        self.script.get_mut().confirmations.push_back(answer);
        self
    }

    /// Queues a file selection.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.script.get_mut().files.push_back(Some(path.into()));
        self
    }

    /// Every confirmation request seen so far, oldest first.
    pub async fn confirmations(&self) -> Vec<Confirmation> {
        self.script.lock().await.asked.clone()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn category_name(&self) -> Option<String> {
        self.script.lock().await.names.pop_front().flatten()
    }

    async fn url_entry(&self) -> Option<UrlForm> {
        self.script.lock().await.forms.pop_front().flatten()
    }

    async fn confirm(&self, request: &Confirmation) -> bool {
        let mut script = self.script.lock().await;
        script.asked.push(request.clone());
        script.confirmations.pop_front().unwrap_or(false)
    }

    async fn import_file(&self) -> Option<PathBuf> {
        self.script.lock().await.files.pop_front().flatten()
    }
}
