use std::cmp::min;

use anyhow::Result;
use crossterm::event::KeyCode;

use crate::auth::{Role, Session};
use crate::ledger::PcbState;
use crate::models::ReportRow;
use crate::reports::{ReportKind, Reports};

use super::forms::ReworkForm;

/// Roles offered on the login screen, in display order.
pub(crate) const LOGIN_ROLES: [Role; 2] = [Role::Admin, Role::Operator];

pub(crate) struct LoginScreen {
    pub(crate) selected: usize,
}

impl LoginScreen {
    pub(crate) fn new() -> Self {
        Self { selected: 0 }
    }

    pub(crate) fn move_selection(&mut self, delta: isize) {
        let len = LOGIN_ROLES.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    pub(crate) fn current_role(&self) -> Role {
        LOGIN_ROLES[self.selected.min(LOGIN_ROLES.len() - 1)]
    }
}

/// Dashboard actions. Admin-only items are hidden from operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuItem {
    AddModel,
    AddEntry,
    ViewEntries,
    DoRework,
    ViewReworkLogs,
    Reports,
    AddOperator,
    ViewOperators,
    ClearAllData,
    Logout,
}

const MENU_ORDER: [MenuItem; 10] = [
    MenuItem::AddModel,
    MenuItem::AddEntry,
    MenuItem::ViewEntries,
    MenuItem::DoRework,
    MenuItem::ViewReworkLogs,
    MenuItem::Reports,
    MenuItem::AddOperator,
    MenuItem::ViewOperators,
    MenuItem::ClearAllData,
    MenuItem::Logout,
];

impl MenuItem {
    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuItem::AddModel => "Add New Model",
            MenuItem::AddEntry => "Add New Entry",
            MenuItem::ViewEntries => "View Entries",
            MenuItem::DoRework => "Do Rework",
            MenuItem::ViewReworkLogs => "View Rework Logs",
            MenuItem::Reports => "Reports",
            MenuItem::AddOperator => "Add New Operator",
            MenuItem::ViewOperators => "View Operator List",
            MenuItem::ClearAllData => "Clear All Data",
            MenuItem::Logout => "Logout",
        }
    }

    fn admin_only(self) -> bool {
        matches!(
            self,
            MenuItem::AddModel
                | MenuItem::AddOperator
                | MenuItem::ViewOperators
                | MenuItem::ClearAllData
        )
    }
}

pub(crate) struct MenuScreen {
    pub(crate) items: Vec<MenuItem>,
    pub(crate) selected: usize,
}

impl MenuScreen {
    pub(crate) fn for_session(session: &Session) -> Self {
        let items = MENU_ORDER
            .iter()
            .copied()
            .filter(|item| session.is_admin() || !item.admin_only())
            .collect();
        Self { items, selected: 0 }
    }

    pub(crate) fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let len = self.items.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    pub(crate) fn current(&self) -> Option<MenuItem> {
        self.items.get(self.selected).copied()
    }
}

/// Rows skipped by PageUp/PageDown in table screens.
const PAGE_STEP: isize = 10;

/// Scrollable read-only table of rows.
pub(crate) struct TableScreen<T> {
    pub(crate) rows: Vec<T>,
    pub(crate) selected: usize,
}

impl<T> TableScreen<T> {
    pub(crate) fn new(rows: Vec<T>) -> Self {
        Self { rows, selected: 0 }
    }

    /// Swap in freshly loaded rows, keeping the cursor in bounds.
    pub(crate) fn replace(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.ensure_in_bounds();
    }

    pub(crate) fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.selected = 0;
            return;
        }
        let max_index = self.rows.len() as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, max_index);
        self.selected = next as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.rows.len().saturating_sub(1);
    }

    /// Apply a navigation key. Returns `false` for keys it does not handle.
    pub(crate) fn handle_nav(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => self.select_first(),
            KeyCode::End => self.select_last(),
            _ => return false,
        }
        true
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = min(self.selected, self.rows.len().saturating_sub(1));
    }
}

pub(crate) struct ReportScreen {
    pub(crate) kind: ReportKind,
    pub(crate) table: TableScreen<ReportRow>,
}

impl ReportScreen {
    pub(crate) fn load(reports: &Reports, kind: ReportKind) -> Result<Self> {
        let rows = reports.rows(kind)?;
        Ok(Self {
            kind,
            table: TableScreen::new(rows),
        })
    }

    pub(crate) fn cycle(&mut self, reports: &Reports) -> Result<()> {
        let kind = self.kind.next();
        let rows = reports.rows(kind)?;
        self.kind = kind;
        self.table = TableScreen::new(rows);
        Ok(())
    }
}

/// The "Do Rework" screen: a PCB lookup plus the action input.
#[derive(Default)]
pub(crate) struct ReworkScreen {
    pub(crate) form: ReworkForm,
    /// Result of the last lookup for the PCB ID currently in the form.
    pub(crate) state: Option<PcbState>,
}

impl ReworkScreen {
    /// Whether the looked-up PCB can take a rework.
    pub(crate) fn can_submit(&self) -> bool {
        matches!(
            self.state,
            Some(PcbState::Pending { .. }) | Some(PcbState::Resolved { .. })
        )
    }

    pub(crate) fn reset(&mut self) {
        self.form = ReworkForm::default();
        self.state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_selection_stays_in_bounds() {
        let mut table = TableScreen::new(vec![1, 2, 3]);
        table.move_selection(10);
        assert_eq!(table.selected, 2);
        table.move_selection(-10);
        assert_eq!(table.selected, 0);
        table.select_last();
        table.replace(vec![1]);
        assert_eq!(table.selected, 0);
    }

    #[test]
    fn navigation_keys_move_the_cursor() {
        let mut table = TableScreen::new((0..30).collect::<Vec<_>>());
        assert!(table.handle_nav(KeyCode::PageDown));
        assert_eq!(table.selected, 10);
        assert!(table.handle_nav(KeyCode::End));
        assert_eq!(table.selected, 29);
        assert!(table.handle_nav(KeyCode::Home));
        assert_eq!(table.selected, 0);
        assert!(!table.handle_nav(KeyCode::Char('x')));
    }

    #[test]
    fn login_selection_wraps() {
        let mut login = LoginScreen::new();
        assert_eq!(login.current_role(), Role::Admin);
        login.move_selection(1);
        assert_eq!(login.current_role(), Role::Operator);
        login.move_selection(1);
        assert_eq!(login.current_role(), Role::Admin);
    }

    #[test]
    fn admin_only_items_are_flagged() {
        assert!(MenuItem::ClearAllData.admin_only());
        assert!(MenuItem::AddModel.admin_only());
        assert!(!MenuItem::DoRework.admin_only());
        assert!(!MenuItem::Logout.admin_only());
    }
}
