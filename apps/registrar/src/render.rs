use std::sync::Mutex;

use client_core::{
    view::{candidate_strip, shorten_address, NavMenu, VoterCard},
    Navigator, Notification, Severity,
};
use shared::domain::{Route, VoterRecord};

/// Records route changes requested by the workflow and prints them.
#[derive(Default)]
pub struct TerminalNavigator {
    current: Mutex<Option<Route>>,
}

impl TerminalNavigator {
    pub fn current(&self) -> Option<Route> {
        self.current.lock().ok().and_then(|route| *route)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        if let Ok(mut current) = self.current.lock() {
            *current = Some(route);
        }
        println!("-> {} ({})", route.title(), route.path());
    }
}

pub fn notification_line(notification: &Notification) -> String {
    let marker = match notification.severity {
        Severity::Info => "..",
        Severity::Success => "ok",
        Severity::Error => "!!",
    };
    format!(
        "[{marker}] {:<8} {}",
        notification.key.as_str(),
        notification.message
    )
}

pub fn voter_card_lines(voter: &VoterRecord) -> Vec<String> {
    let card = VoterCard::from_record(voter);
    vec![
        card.title,
        format!("  image:  {}", card.image),
        format!("  wallet: {}", card.wallet),
        format!("  status: {}", card.status),
    ]
}

pub fn print_voters(voters: &[VoterRecord]) {
    if voters.is_empty() {
        println!("No voters registered yet.");
        return;
    }
    for voter in voters {
        for line in voter_card_lines(voter) {
            println!("{line}");
        }
    }
}

pub fn print_candidates(voters: &[VoterRecord]) {
    for line in candidate_strip(voters) {
        println!("  {line}");
    }
}

pub fn print_nav(account: Option<&str>) {
    let mut menu = NavMenu::default();
    menu.toggle();
    println!("Account: {}", shorten_address(account));
    for route in menu.entries() {
        println!("  {:<24} {}", route.title(), route.path());
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
