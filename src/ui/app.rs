use std::mem;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use crate::auth::{hash_password, AccessGate, Role, Session};
use crate::config::Config;
use crate::export::take_backup;
use crate::ledger::{Ledger, PcbState, ReworkOutcome};
use crate::models::{now, Entry, Operator, ReworkLogEntry};
use crate::reports::{ReportKind, Reports};

use super::forms::{
    AdminCheck, AdminPurpose, AdminSetupForm, CredentialField, CredentialForm, EntryField,
    EntryForm, ModelForm, ReworkField, SetupField,
};
use super::helpers::{centered_rect, format_timestamp, role_label, surface_error};
use super::screens::{
    LoginScreen, MenuItem, MenuScreen, ReportScreen, ReworkScreen, TableScreen, LOGIN_ROLES,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// High-level navigation states.
enum Screen {
    Login(LoginScreen),
    Dashboard(MenuScreen),
    Entries(TableScreen<Entry>),
    ReworkLogs(TableScreen<ReworkLogEntry>),
    Operators(TableScreen<Operator>),
    Reports(ReportScreen),
    Rework(ReworkScreen),
}

/// Modal overlays scoped to the current screen.
enum Mode {
    Normal,
    LoggingIn { role: Role, form: CredentialForm },
    SettingUpAdmin(AdminSetupForm),
    AddingModel(ModelForm),
    AddingEntry(EntryForm),
    AddingOperator(CredentialForm),
    VerifyingAdmin(AdminCheck),
    ConfirmClearData,
    ConfirmLogout,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    config: Config,
    ledger: Ledger,
    reports: Reports,
    gate: AccessGate,
    session: Option<Session>,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    last_backup: Option<PathBuf>,
}

impl App {
    pub fn new(config: Config, ledger: Ledger, reports: Reports, gate: AccessGate) -> Self {
        let mut app = Self {
            config,
            ledger,
            reports,
            gate,
            session: None,
            screen: Screen::Login(LoginScreen::new()),
            mode: Mode::Normal,
            status: None,
            last_backup: None,
        };
        if !app.gate.admin_configured() {
            app.set_status(
                "No admin password configured yet. Choose Admin to set one.",
                StatusKind::Info,
            );
        }
        app
    }

    /// Route a key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::LoggingIn { role, form } => self.handle_login_form(code, role, form),
            Mode::SettingUpAdmin(form) => self.handle_admin_setup(code, form),
            Mode::AddingModel(form) => self.handle_add_model(code, form),
            Mode::AddingEntry(form) => self.handle_add_entry(code, form),
            Mode::AddingOperator(form) => self.handle_add_operator(code, form),
            Mode::VerifyingAdmin(check) => self.handle_verify_admin(code, check),
            Mode::ConfirmClearData => self.handle_confirm_clear(code),
            Mode::ConfirmLogout => self.handle_confirm_logout(code),
        };

        Ok(exit)
    }

    /// Reload whatever the current screen is showing.
    pub(crate) fn handle_ctrl_r(&mut self) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        let result = self.refresh_screen();
        self.report(result);
        Ok(())
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match self.screen {
            Screen::Login(_) => self.handle_login_screen(code, exit),
            Screen::Dashboard(_) => self.handle_dashboard(code, exit),
            Screen::Rework(_) => {
                self.handle_rework_key(code);
                Mode::Normal
            }
            Screen::Entries(_)
            | Screen::Operators(_)
            | Screen::ReworkLogs(_)
            | Screen::Reports(_) => {
                self.handle_table_key(code);
                Mode::Normal
            }
        }
    }

    fn handle_login_screen(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        let Screen::Login(login) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => login.move_selection(-1),
            KeyCode::Down | KeyCode::Tab => login.move_selection(1),
            KeyCode::Enter => {
                let role = login.current_role();
                self.clear_status();
                return match role {
                    Role::Admin if !self.gate.admin_configured() => {
                        Mode::SettingUpAdmin(AdminSetupForm::default())
                    }
                    Role::Admin => Mode::LoggingIn {
                        role,
                        form: CredentialForm::with_username(self.gate.admin_username()),
                    },
                    Role::Operator => Mode::LoggingIn {
                        role,
                        form: CredentialForm::default(),
                    },
                };
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_dashboard(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        let Screen::Dashboard(menu) = &mut self.screen else {
            return Mode::Normal;
        };
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => return Mode::ConfirmLogout,
            KeyCode::Up => menu.move_selection(-1),
            KeyCode::Down => menu.move_selection(1),
            KeyCode::Enter => {
                if let Some(item) = menu.current() {
                    self.clear_status();
                    return self.activate(item);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn activate(&mut self, item: MenuItem) -> Mode {
        match item {
            MenuItem::AddModel => return Mode::AddingModel(ModelForm::default()),
            MenuItem::AddEntry => match self.ledger.list_models() {
                Ok(models) if models.is_empty() => self.set_status(
                    "No models yet. An admin must add one first.",
                    StatusKind::Error,
                ),
                Ok(models) => return Mode::AddingEntry(EntryForm::new(&models)),
                Err(err) => self.report(Err(err.into())),
            },
            MenuItem::ViewEntries => {
                let result = self.open_entries();
                self.report(result);
            }
            MenuItem::DoRework => self.screen = Screen::Rework(ReworkScreen::default()),
            MenuItem::ViewReworkLogs => {
                let result = self.open_rework_logs();
                self.report(result);
            }
            MenuItem::Reports => {
                let result = self.open_reports();
                self.report(result);
            }
            MenuItem::AddOperator => return Mode::AddingOperator(CredentialForm::default()),
            MenuItem::ViewOperators => {
                return Mode::VerifyingAdmin(AdminCheck::new(AdminPurpose::ViewOperators))
            }
            MenuItem::ClearAllData => {
                return Mode::VerifyingAdmin(AdminCheck::new(AdminPurpose::ClearData))
            }
            MenuItem::Logout => return Mode::ConfirmLogout,
        }
        Mode::Normal
    }

    fn handle_table_key(&mut self, code: KeyCode) {
        let handled = match &mut self.screen {
            Screen::Entries(table) => table.handle_nav(code),
            Screen::ReworkLogs(table) => table.handle_nav(code),
            Screen::Operators(table) => table.handle_nav(code),
            Screen::Reports(report) => report.table.handle_nav(code),
            _ => false,
        };
        if handled {
            return;
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.clear_status();
                self.open_dashboard();
            }
            KeyCode::Char('r') => {
                let result = self.refresh_screen();
                self.report(result);
            }
            KeyCode::Tab => {
                if let Screen::Reports(report) = &mut self.screen {
                    let result = report.cycle(&self.reports);
                    self.report(result);
                }
            }
            KeyCode::Char('b')
                if matches!(self.screen, Screen::ReworkLogs(_)) && self.is_admin() =>
            {
                let result = self.backup();
                self.report(result);
            }
            KeyCode::Char('o')
                if matches!(self.screen, Screen::ReworkLogs(_)) && self.is_admin() =>
            {
                let result = self.open_backup_folder();
                self.report(result);
            }
            _ => {}
        }
    }

    fn handle_rework_key(&mut self, code: KeyCode) {
        let active = match &self.screen {
            Screen::Rework(rework) => rework.form.active,
            _ => return,
        };

        match code {
            KeyCode::Esc => {
                self.clear_status();
                self.open_dashboard();
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Enter if active == ReworkField::PcbId => {
                let result = self.lookup_pcb();
                self.report(result);
            }
            KeyCode::Tab | KeyCode::BackTab => {
                if let Screen::Rework(rework) = &mut self.screen {
                    rework.form.focus(ReworkField::PcbId);
                }
            }
            KeyCode::Enter => {
                let result = self.submit_rework();
                self.report(result);
            }
            KeyCode::Backspace | KeyCode::Char(_) => {
                let Screen::Rework(rework) = &mut self.screen else {
                    return;
                };
                let changed = match code {
                    KeyCode::Char(ch) => rework.form.push_char(ch),
                    _ => {
                        rework.form.backspace();
                        true
                    }
                };
                if changed {
                    rework.form.error = None;
                    if active == ReworkField::PcbId {
                        rework.state = None;
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_login_form(&mut self, code: KeyCode, role: Role, mut form: CredentialForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.attempt_login(role, &form) {
                Ok(true) => return Mode::Normal,
                Ok(false) => {
                    form.clear_password();
                    form.error = Some("Invalid credentials.".to_string());
                    self.set_status("Invalid credentials.", StatusKind::Error);
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::LoggingIn { role, form }
    }

    fn handle_admin_setup(&mut self, code: KeyCode, mut form: AdminSetupForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Admin setup cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_admin_password(&form) {
                Ok(path) => {
                    self.set_status(
                        format!("Admin password saved to {}.", path.display()),
                        StatusKind::Info,
                    );
                    return Mode::LoggingIn {
                        role: Role::Admin,
                        form: CredentialForm::with_username(self.gate.admin_username()),
                    };
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::SettingUpAdmin(form)
    }

    fn handle_add_model(&mut self, code: KeyCode, mut form: ModelForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add model cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_model(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingModel(form)
    }

    fn handle_add_entry(&mut self, code: KeyCode, mut form: EntryForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add entry cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left => form.cycle_choice(-1),
            KeyCode::Right => form.cycle_choice(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_entry(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingEntry(form)
    }

    fn handle_add_operator(&mut self, code: KeyCode, mut form: CredentialForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add operator cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_operator(&form) {
                Ok(()) => return Mode::Normal,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingOperator(form)
    }

    fn handle_verify_admin(&mut self, code: KeyCode, mut check: AdminCheck) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_status();
                return Mode::Normal;
            }
            KeyCode::Backspace => check.backspace(),
            KeyCode::Enter => {
                if !self.gate.verify_admin_password(&check.password) {
                    check.password.clear();
                    check.error = Some("Incorrect admin password.".to_string());
                    self.set_status("Incorrect admin password.", StatusKind::Error);
                    return Mode::VerifyingAdmin(check);
                }
                return match check.purpose {
                    AdminPurpose::ViewOperators => {
                        let result = self.open_operators();
                        self.report(result);
                        Mode::Normal
                    }
                    AdminPurpose::ClearData => Mode::ConfirmClearData,
                };
            }
            KeyCode::Char(ch) => {
                if check.push_char(ch) {
                    check.error = None;
                }
            }
            _ => {}
        }
        Mode::VerifyingAdmin(check)
    }

    fn handle_confirm_clear(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = self.clear_all_data();
                self.report(result);
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Clear all data cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmClearData,
        }
    }

    fn handle_confirm_logout(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.logout();
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Mode::Normal,
            _ => Mode::ConfirmLogout,
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Login(login) => self.draw_login(frame, content_area, login),
            Screen::Dashboard(menu) => self.draw_dashboard(frame, content_area, menu),
            Screen::Entries(table) => self.draw_entries(frame, content_area, table),
            Screen::ReworkLogs(table) => self.draw_rework_logs(frame, content_area, table),
            Screen::Operators(table) => self.draw_operators(frame, content_area, table),
            Screen::Reports(report) => self.draw_report(frame, content_area, report),
            Screen::Rework(rework) => self.draw_rework(frame, content_area, rework),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Normal => {}
            Mode::LoggingIn { role, form } => {
                let title = format!("{} Login", role_label(*role));
                self.draw_credential_form(frame, area, &title, form);
            }
            Mode::SettingUpAdmin(form) => self.draw_admin_setup(frame, area, form),
            Mode::AddingModel(form) => self.draw_model_form(frame, area, form),
            Mode::AddingEntry(form) => self.draw_entry_form(frame, area, form),
            Mode::AddingOperator(form) => {
                self.draw_credential_form(frame, area, "Add New Operator", form)
            }
            Mode::VerifyingAdmin(check) => self.draw_admin_check(frame, area, check),
            Mode::ConfirmClearData => self.draw_confirm(
                frame,
                area,
                "Clear All Data",
                "Delete ALL entries, rework logs and models? This cannot be undone.",
            ),
            Mode::ConfirmLogout => self.draw_confirm(
                frame,
                area,
                "Logout",
                "Are you sure you want to logout?",
            ),
        }
    }

    fn draw_login(&self, frame: &mut Frame, area: Rect, login: &LoginScreen) {
        let popup_area = centered_rect(40, 40, area);
        let block = Block::default()
            .title("PCB Rework Tracker")
            .borders(Borders::ALL);
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);
        frame.render_widget(
            Paragraph::new("Login as:").alignment(Alignment::Center),
            chunks[0],
        );

        let items: Vec<ListItem> = LOGIN_ROLES
            .iter()
            .map(|role| ListItem::new(Line::from(role_label(*role))))
            .collect();
        let list = List::new(items)
            .highlight_style(selected_style())
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(login.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect, menu: &MenuScreen) {
        let title = match &self.session {
            Some(session) => format!(
                "Hi, {}! ({})",
                session.username(),
                role_label(session.role())
            ),
            None => "Dashboard".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let items: Vec<ListItem> = menu
            .items
            .iter()
            .map(|item| ListItem::new(Line::from(item.label())))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(selected_style())
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(menu.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_entries(&self, frame: &mut Frame, area: Rect, table: &TableScreen<Entry>) {
        let rows = table
            .rows
            .iter()
            .map(|entry| {
                Row::new(vec![
                    entry.sr_no.to_string(),
                    entry.pcb_id.clone(),
                    entry.model.clone(),
                    format_timestamp(&entry.timestamp),
                    entry.rejection_stage.clone(),
                    entry.rejection_details.clone(),
                ])
            })
            .collect();
        self.draw_table(
            frame,
            area,
            format!("Pending Entries ({})", table.rows.len()),
            &[
                "Sr No",
                "PCB ID",
                "Model",
                "Timestamp",
                "Rejection Stage",
                "Rejection Details",
            ],
            &[
                Constraint::Length(6),
                Constraint::Percentage(16),
                Constraint::Percentage(14),
                Constraint::Length(19),
                Constraint::Percentage(16),
                Constraint::Min(12),
            ],
            rows,
            table.selected,
        );
    }

    fn draw_rework_logs(&self, frame: &mut Frame, area: Rect, table: &TableScreen<ReworkLogEntry>) {
        let rows = table
            .rows
            .iter()
            .map(|rework| {
                Row::new(vec![
                    rework.id.to_string(),
                    rework.pcb_id.clone(),
                    rework.rework_no.to_string(),
                    rework.rework_action.clone(),
                    format_timestamp(&rework.rework_date),
                    rework.rework_done_by.clone(),
                ])
            })
            .collect();
        self.draw_table(
            frame,
            area,
            format!("Rework Logs ({})", table.rows.len()),
            &[
                "Id",
                "PCB ID",
                "Rework No",
                "Rework Action",
                "Rework Date",
                "Done By",
            ],
            &[
                Constraint::Length(6),
                Constraint::Percentage(16),
                Constraint::Length(9),
                Constraint::Min(16),
                Constraint::Length(19),
                Constraint::Percentage(14),
            ],
            rows,
            table.selected,
        );
    }

    fn draw_operators(&self, frame: &mut Frame, area: Rect, table: &TableScreen<Operator>) {
        let rows = table
            .rows
            .iter()
            .map(|operator| Row::new(vec![operator.id.to_string(), operator.username.clone()]))
            .collect();
        self.draw_table(
            frame,
            area,
            format!("Operators ({})", table.rows.len()),
            &["Id", "Username"],
            &[Constraint::Length(6), Constraint::Min(12)],
            rows,
            table.selected,
        );
    }

    fn draw_report(&self, frame: &mut Frame, area: Rect, report: &ReportScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let tabs: Vec<Span> = [ReportKind::Pending, ReportKind::Reworked, ReportKind::All]
            .iter()
            .flat_map(|kind| {
                let style = if *kind == report.kind {
                    selected_style()
                } else {
                    Style::default().fg(Color::Gray)
                };
                [Span::styled(format!(" {} ", kind.title()), style), Span::raw(" ")]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(tabs)), chunks[0]);

        let rows = report
            .table
            .rows
            .iter()
            .map(|row| {
                Row::new(vec![
                    row.sr_no.to_string(),
                    row.pcb_id.clone(),
                    row.model.clone(),
                    row.rejection_details.clone(),
                    row.status.to_string(),
                    row.rework_no.map(|no| no.to_string()).unwrap_or_default(),
                    row.rework_done_by.clone().unwrap_or_default(),
                    format_timestamp(&row.date),
                    row.rework_action.clone().unwrap_or_default(),
                ])
            })
            .collect();
        self.draw_table(
            frame,
            chunks[1],
            format!("{} ({})", report.kind.title(), report.table.rows.len()),
            &[
                "Sr No",
                "PCB ID",
                "Model",
                "Rejection Details",
                "Status",
                "Rework No",
                "Done By",
                "Date",
                "Rework Action",
            ],
            &[
                Constraint::Length(6),
                Constraint::Percentage(12),
                Constraint::Percentage(10),
                Constraint::Percentage(14),
                Constraint::Length(9),
                Constraint::Length(9),
                Constraint::Percentage(9),
                Constraint::Length(19),
                Constraint::Min(10),
            ],
            rows,
            report.table.selected,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_table(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: String,
        headers: &[&'static str],
        widths: &[Constraint],
        rows: Vec<Row<'static>>,
        selected: usize,
    ) {
        let block = Block::default().title(title).borders(Borders::ALL);
        if rows.is_empty() {
            let paragraph = Paragraph::new("No records.")
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(headers.to_vec()).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let table = Table::new(rows, widths.to_vec())
            .header(header)
            .block(block)
            .row_highlight_style(selected_style())
            .highlight_symbol("> ");
        let mut state = TableState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_rework(&self, frame: &mut Frame, area: Rect, rework: &ReworkScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(area);

        let form_block = Block::default().title("Do Rework").borders(Borders::ALL);
        let form_inner = form_block.inner(chunks[0]);
        frame.render_widget(form_block, chunks[0]);

        let mut lines = vec![
            rework.form.build_line(ReworkField::PcbId),
            rework.form.build_line(ReworkField::Action),
        ];
        if let Some(error) = &rework.form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        frame.render_widget(Paragraph::new(lines), form_inner);

        if matches!(self.mode, Mode::Normal) {
            let (prefix, row) = match rework.form.active {
                ReworkField::PcbId => ("PCB ID: ", 0),
                ReworkField::Action => ("Rework action: ", 1),
            };
            let cursor_x =
                form_inner.x + prefix.len() as u16 + rework.form.value_len(rework.form.active) as u16;
            frame.set_cursor_position((cursor_x, form_inner.y + row));
        }

        let details = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);

        let label = Style::default().fg(Color::Gray);
        let entry_lines: Vec<Line> = match &rework.state {
            None => vec![Line::from(Span::styled(
                "Enter a PCB ID and press Enter to look it up.",
                label,
            ))],
            Some(PcbState::Unknown) => vec![Line::from(Span::styled(
                "PCB ID not found in entries or rework logs.",
                Style::default().fg(Color::Red),
            ))],
            Some(PcbState::Pending { entry, .. }) => vec![
                detail_line("Sr No", entry.sr_no.to_string()),
                detail_line("Model", entry.model.clone()),
                detail_line("Logged", format_timestamp(&entry.timestamp)),
                detail_line("Rejection stage", entry.rejection_stage.clone()),
                detail_line("Rejection details", entry.rejection_details.clone()),
            ],
            Some(PcbState::Resolved { reworks }) => vec![
                Line::from(Span::styled(
                    "Already Reworked",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                detail_line("Previous reworks", reworks.len().to_string()),
            ],
        };
        let entry_panel = Paragraph::new(entry_lines)
            .block(Block::default().title("Entry").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(entry_panel, details[0]);

        let history: Vec<ListItem> = rework
            .state
            .as_ref()
            .map(|state| state.reworks())
            .unwrap_or_default()
            .iter()
            .map(|row| ListItem::new(Line::from(row.summary())))
            .collect();
        let history_list = List::new(history)
            .block(Block::default().title("Previous Reworks").borders(Borders::ALL));
        frame.render_widget(history_list, details[1]);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        match (&self.screen, &self.mode) {
            (_, Mode::AddingEntry(_)) => key_hints(&[
                ("[Tab]", "Next field"),
                ("[\u{2190}\u{2192}]", "Choose"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ]),
            (_, Mode::ConfirmClearData) | (_, Mode::ConfirmLogout) => {
                key_hints(&[("[y]", "Yes"), ("[n]", "No")])
            }
            (_, Mode::LoggingIn { .. })
            | (_, Mode::SettingUpAdmin(_))
            | (_, Mode::AddingOperator(_)) => key_hints(&[
                ("[Tab]", "Switch field"),
                ("[Enter]", "Submit"),
                ("[Esc]", "Cancel"),
            ]),
            (_, Mode::AddingModel(_)) | (_, Mode::VerifyingAdmin(_)) => {
                key_hints(&[("[Enter]", "Submit"), ("[Esc]", "Cancel")])
            }
            (Screen::Login(_), Mode::Normal) => key_hints(&[
                ("[\u{2191}\u{2193}]", "Choose role"),
                ("[Enter]", "Login"),
                ("[q]", "Quit"),
            ]),
            (Screen::Dashboard(_), Mode::Normal) => key_hints(&[
                ("[\u{2191}\u{2193}]", "Navigate"),
                ("[Enter]", "Open"),
                ("[Esc]", "Logout"),
                ("[q]", "Quit"),
            ]),
            (Screen::Rework(_), Mode::Normal) => key_hints(&[
                ("[Enter]", "Look up / Submit"),
                ("[Tab]", "Switch field"),
                ("[Esc]", "Back"),
            ]),
            (Screen::ReworkLogs(_), Mode::Normal) if self.is_admin() => key_hints(&[
                ("[\u{2191}\u{2193}]", "Scroll"),
                ("[b]", "Backup to Excel"),
                ("[o]", "Open backup folder"),
                ("[r]", "Refresh"),
                ("[Esc]", "Back"),
            ]),
            (Screen::Reports(_), Mode::Normal) => key_hints(&[
                ("[Tab]", "Next report"),
                ("[\u{2191}\u{2193}]", "Scroll"),
                ("[r]", "Refresh"),
                ("[Esc]", "Back"),
            ]),
            (Screen::Entries(_), Mode::Normal)
            | (Screen::Operators(_), Mode::Normal)
            | (Screen::ReworkLogs(_), Mode::Normal) => {
                key_hints(&[
                    ("[\u{2191}\u{2193}]", "Scroll"),
                    ("[r]", "Refresh"),
                    ("[Esc]", "Back"),
                ])
            }
        }
    }

    fn draw_credential_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &CredentialForm) {
        let lines = vec![
            form.build_line(CredentialField::Username),
            form.build_line(CredentialField::Password),
        ];
        let cursor = match form.active {
            CredentialField::Username => (0, "Username: ".len() + form.value_len(form.active)),
            CredentialField::Password => (1, "Password: ".len() + form.value_len(form.active)),
        };
        self.draw_form(
            frame,
            area,
            title,
            lines,
            form.error.as_deref(),
            "Enter to submit \u{2022} Tab to switch \u{2022} Esc to cancel",
            cursor,
        );
    }

    fn draw_admin_setup(&self, frame: &mut Frame, area: Rect, form: &AdminSetupForm) {
        let lines = vec![
            Line::from(format!(
                "Set a password for admin user '{}'.",
                self.gate.admin_username()
            )),
            Line::from(""),
            form.build_line(SetupField::Password),
            form.build_line(SetupField::Confirm),
        ];
        let cursor = match form.active {
            SetupField::Password => (2, "Password: ".len() + form.value_len(form.active)),
            SetupField::Confirm => (3, "Confirm: ".len() + form.value_len(form.active)),
        };
        self.draw_form(
            frame,
            area,
            "Set Admin Password",
            lines,
            form.error.as_deref(),
            "Enter to save \u{2022} Tab to switch \u{2022} Esc to cancel",
            cursor,
        );
    }

    fn draw_model_form(&self, frame: &mut Frame, area: Rect, form: &ModelForm) {
        let cursor = (0, "Model name: ".len() + form.name.chars().count());
        self.draw_form(
            frame,
            area,
            "Add New Model",
            vec![form.build_line()],
            form.error.as_deref(),
            "Enter to save \u{2022} Esc to cancel",
            cursor,
        );
    }

    fn draw_entry_form(&self, frame: &mut Frame, area: Rect, form: &EntryForm) {
        let fields = [
            EntryField::PcbId,
            EntryField::Model,
            EntryField::Stage,
            EntryField::Reason,
        ];
        let lines = fields.iter().map(|field| form.build_line(*field)).collect();
        let cursor = match form.active {
            EntryField::PcbId => (0, "PCB ID: ".len() + form.value_len(form.active)),
            EntryField::Model => (1, "Model: ".len()),
            EntryField::Stage => (2, "Rejection stage: ".len() + form.value_len(form.active)),
            EntryField::Reason => (3, "Rejection reason: ".len()),
        };
        self.draw_form(
            frame,
            area,
            "Add New Entry",
            lines,
            form.error.as_deref(),
            "Enter to save \u{2022} Tab to move \u{2022} \u{2190}/\u{2192} to choose \u{2022} Esc to cancel",
            cursor,
        );
    }

    fn draw_admin_check(&self, frame: &mut Frame, area: Rect, check: &AdminCheck) {
        let cursor = (0, "Admin password: ".len() + check.password.chars().count());
        self.draw_form(
            frame,
            area,
            check.purpose.title(),
            vec![check.build_line()],
            check.error.as_deref(),
            "Enter to continue \u{2022} Esc to cancel",
            cursor,
        );
    }

    /// Popup with input lines, an error or hint row, and the cursor placed at
    /// `(line, column)` inside the block.
    #[allow(clippy::too_many_arguments)]
    fn draw_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        mut lines: Vec<Line<'static>>,
        error: Option<&str>,
        hint: &'static str,
        cursor: (usize, usize),
    ) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        match error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            ))),
            None => lines.push(Line::from(Span::styled(
                hint,
                Style::default().fg(Color::Gray),
            ))),
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (row, column) = cursor;
        frame.set_cursor_position((inner.x + column as u16, inner.y + row as u16));
    }

    fn draw_confirm(&self, frame: &mut Frame, area: Rect, title: &str, question: &str) {
        let popup_area = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup_area);

        let lines = vec![
            Line::from(question.to_string()),
            Line::from(""),
            Line::from(Span::styled(
                "y to confirm \u{2022} n to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(title.to_string())
                    .borders(Borders::ALL),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// Show a failed operation in the footer. Nothing a single action does is
    /// fatal to the UI.
    fn report(&mut self, result: Result<()>) {
        if let Err(err) = result {
            log::warn!("{err:#}");
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    fn current_session(&self) -> Result<Session> {
        self.session
            .clone()
            .ok_or_else(|| anyhow!("Please log in first."))
    }

    fn attempt_login(&mut self, role: Role, form: &CredentialForm) -> Result<bool> {
        let (username, password) = form.parse_inputs()?;
        let session = match role {
            Role::Admin => self.gate.login_admin(&username, &password),
            Role::Operator => self.gate.login_operator(&username, &password)?,
        };
        let Some(session) = session else {
            return Ok(false);
        };

        self.set_status(format!("Hi, {}!", session.username()), StatusKind::Info);
        self.screen = Screen::Dashboard(MenuScreen::for_session(&session));
        self.session = Some(session);
        Ok(true)
    }

    fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            log::info!("{} logged out", session.username());
        }
        self.screen = Screen::Login(LoginScreen::new());
        self.set_status("Logged out.", StatusKind::Info);
    }

    /// Hash the new admin password and persist it to the config file on disk.
    /// Environment overrides applied to the running config are not written.
    fn save_admin_password(&mut self, form: &AdminSetupForm) -> Result<PathBuf> {
        let password = form.parse_inputs()?;
        let hash = hash_password(&password, self.config.bcrypt_cost)?;

        let path = Config::config_path()?;
        let mut on_disk = Config::load_from(&path)?;
        on_disk.admin_password_hash = Some(hash.clone());
        on_disk.save_to(&path)?;

        self.config.admin_password_hash = Some(hash);
        self.gate.set_admin_credential(self.config.admin_credential());
        log::info!("admin password configured in {}", path.display());
        Ok(path)
    }

    fn save_model(&mut self, form: &ModelForm) -> Result<()> {
        let session = self.current_session()?;
        let name = form.parse_inputs()?;
        let model = self.ledger.add_model(&session, &name)?;
        self.set_status(format!("Model '{}' added.", model.name), StatusKind::Info);
        Ok(())
    }

    fn save_entry(&mut self, form: &EntryForm) -> Result<()> {
        let session = self.current_session()?;
        let (pcb_id, model, stage, reason) = form.parse_inputs()?;
        let entry = self
            .ledger
            .record_rejection(&session, &pcb_id, &model, &stage, &reason)?;
        self.set_status(
            format!("Entry {} saved (Sr No {}).", entry.pcb_id, entry.sr_no),
            StatusKind::Info,
        );
        Ok(())
    }

    fn save_operator(&mut self, form: &CredentialForm) -> Result<()> {
        let session = self.current_session()?;
        let (username, password) = form.parse_inputs()?;
        let operator = self
            .gate
            .register_operator(&session, &username, &password)?;
        self.set_status(
            format!("Operator '{}' added.", operator.username),
            StatusKind::Info,
        );
        Ok(())
    }

    fn clear_all_data(&mut self) -> Result<()> {
        let session = self.current_session()?;
        let cleared = self.ledger.clear_all_data(&session)?;
        self.set_status(
            format!(
                "Cleared {} entries, {} rework logs and {} models.",
                cleared.entries, cleared.reworks, cleared.models
            ),
            StatusKind::Info,
        );
        Ok(())
    }

    fn lookup_pcb(&mut self) -> Result<()> {
        let Screen::Rework(rework) = &mut self.screen else {
            return Ok(());
        };
        let pcb_id = rework.form.pcb_id.trim().to_string();
        if pcb_id.is_empty() {
            rework.form.error = Some("PCB ID cannot be empty.".to_string());
            return Ok(());
        }

        let state = self.ledger.lookup(&pcb_id)?;
        let (message, kind) = match &state {
            PcbState::Unknown => (
                "PCB ID not found in entries or rework logs.".to_string(),
                StatusKind::Error,
            ),
            PcbState::Pending { reworks, .. } if !reworks.is_empty() => (
                format!(
                    "{pcb_id} is still pending but has {} rework(s) on record.",
                    reworks.len()
                ),
                StatusKind::Info,
            ),
            PcbState::Pending { .. } => (format!("{pcb_id} is pending rework."), StatusKind::Info),
            PcbState::Resolved { reworks } => (
                format!("{pcb_id} was already reworked {} time(s).", reworks.len()),
                StatusKind::Info,
            ),
        };

        if matches!(state, PcbState::Unknown) {
            rework.form.error = Some(message.clone());
        } else {
            rework.form.error = None;
            rework.form.focus(ReworkField::Action);
        }
        rework.state = Some(state);
        self.set_status(message, kind);
        Ok(())
    }

    fn submit_rework(&mut self) -> Result<()> {
        let session = self.current_session()?;
        let Screen::Rework(rework) = &mut self.screen else {
            return Ok(());
        };
        if !rework.can_submit() {
            rework.form.focus(ReworkField::PcbId);
            return Err(anyhow!("Look up a known PCB ID first."));
        }

        let outcome = match self
            .ledger
            .submit_rework(&session, &rework.form.pcb_id, &rework.form.action)
        {
            Ok(outcome) => outcome,
            Err(err) => {
                rework.form.error = Some(err.to_string());
                return Err(err.into());
            }
        };

        let message = match &outcome {
            ReworkOutcome::Resolved(row) => format!(
                "Rework {} saved. {} is resolved.",
                row.rework_no, row.pcb_id
            ),
            ReworkOutcome::Appended(row) => {
                format!("Rework {} appended for {}.", row.rework_no, row.pcb_id)
            }
        };
        rework.reset();
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn backup(&mut self) -> Result<()> {
        let session = self.current_session()?;
        let root = self.config.backup_root()?;
        let path = take_backup(&self.ledger, &session, &root, now())?;
        self.set_status(
            format!("Backup saved to {}.", path.display()),
            StatusKind::Info,
        );
        self.last_backup = Some(path);
        Ok(())
    }

    fn open_backup_folder(&mut self) -> Result<()> {
        let folder = match self.last_backup.as_deref().and_then(Path::parent) {
            Some(folder) => folder.to_path_buf(),
            None => self.config.backup_root()?,
        };
        if !folder.exists() {
            return Err(anyhow!("No backups yet at {}.", folder.display()));
        }
        open_path(&folder)?;
        self.set_status(format!("Opened {}.", folder.display()), StatusKind::Info);
        Ok(())
    }

    fn open_dashboard(&mut self) {
        self.screen = match &self.session {
            Some(session) => Screen::Dashboard(MenuScreen::for_session(session)),
            None => Screen::Login(LoginScreen::new()),
        };
    }

    fn open_entries(&mut self) -> Result<()> {
        let rows = self.ledger.list_entries()?;
        self.screen = Screen::Entries(TableScreen::new(rows));
        Ok(())
    }

    fn open_rework_logs(&mut self) -> Result<()> {
        let rows = self.ledger.list_all_rework_logs()?;
        self.screen = Screen::ReworkLogs(TableScreen::new(rows));
        Ok(())
    }

    fn open_operators(&mut self) -> Result<()> {
        let session = self.current_session()?;
        let rows = self.gate.list_operators(&session)?;
        self.screen = Screen::Operators(TableScreen::new(rows));
        Ok(())
    }

    fn open_reports(&mut self) -> Result<()> {
        let report = ReportScreen::load(&self.reports, ReportKind::Pending)?;
        self.screen = Screen::Reports(report);
        Ok(())
    }

    fn refresh_screen(&mut self) -> Result<()> {
        match &mut self.screen {
            Screen::Entries(table) => table.replace(self.ledger.list_entries()?),
            Screen::ReworkLogs(table) => table.replace(self.ledger.list_all_rework_logs()?),
            Screen::Operators(table) => {
                let session = self
                    .session
                    .as_ref()
                    .ok_or_else(|| anyhow!("Please log in first."))?;
                table.replace(self.gate.list_operators(session)?);
            }
            Screen::Reports(report) => report.table.replace(self.reports.rows(report.kind)?),
            Screen::Rework(rework) => {
                if rework.state.is_some() {
                    rework.state = Some(self.ledger.lookup(&rework.form.pcb_id)?);
                }
            }
            Screen::Login(_) | Screen::Dashboard(_) => {}
        }
        Ok(())
    }
}

fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn detail_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

fn key_hints(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, action) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::raw(format!(" {action}   ")));
    }
    Line::from(spans)
}
