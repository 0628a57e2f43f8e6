//! Dashboard pages reachable through the route table.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    Main,
    Calendar,
    AdTracking,
    Profile,
    ChangePassword,
    Users,
    TaskHistory,
    InstagramDm,
    NewsletterTemplate,
    YouTubeRepurposing,
    SharedDocument,
    NotFound,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Login => "Login",
            Page::Main => "Dashboard",
            Page::Calendar => "Calendar",
            Page::AdTracking => "Ad Tracking",
            Page::Profile => "Profile",
            Page::ChangePassword => "Change Password",
            Page::Users => "Users",
            Page::TaskHistory => "Task History",
            Page::InstagramDm => "Instagram DM",
            Page::NewsletterTemplate => "Newsletter Template",
            Page::YouTubeRepurposing => "YouTube Repurposing",
            Page::SharedDocument => "Shared Document",
            Page::NotFound => "Page Not Found",
        }
    }
}

/// The shell returned for a resolved page.
#[derive(Serialize, Clone, Debug)]
pub struct PageView {
    pub page: Page,
    pub title: &'static str,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl PageView {
    pub fn new(page: Page, path: impl Into<String>) -> Self {
        Self {
            page,
            title: page.title(),
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}
