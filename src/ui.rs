use fingate::api::FinanceBackend;
use fingate::controller::{Tab, ViewStateController};
use fingate::notify::{Level, Notifier};
use fingate::region::{ChartBackend, ChartInstance, RegionState};
use fingate::snapshot::{ChartData, TxFilter, TxKind};
use fingate::tariff::ChartId;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;

// ============================================================================
// TUI CHART BACKEND
// ============================================================================

/// Chart backend over ratatui: an "instance" is a retained widget config.
/// Instances must be destroyed before a slot is rebound, same as any real
/// chart library holding a render target.
#[derive(Default)]
pub struct TuiChartBackend {
    next: u64,
    figures: HashMap<ChartInstance, Figure>,
}

struct Figure {
    id: ChartId,
    data: ChartData,
}

impl TuiChartBackend {
    fn figure(&self, instance: ChartInstance) -> Option<&Figure> {
        self.figures.get(&instance)
    }
}

impl ChartBackend for TuiChartBackend {
    fn create_chart(&mut self, id: ChartId, data: &ChartData) -> ChartInstance {
        self.next += 1;
        let instance = ChartInstance(self.next);
        self.figures.insert(instance, Figure { id, data: data.clone() });
        instance
    }

    fn destroy_chart(&mut self, instance: ChartInstance) {
        self.figures.remove(&instance);
    }
}

// ============================================================================
// STATUS-LINE NOTIFIER
// ============================================================================

/// Notifier backed by the status bar. The hosting chat platform normally
/// supplies these dialogs; in the terminal build confirms are auto-accepted
/// and messages queue onto the status line.
#[derive(Default)]
pub struct StatusNotifier {
    messages: Vec<(String, Level)>,
}

impl StatusNotifier {
    pub fn latest(&self) -> Option<&(String, Level)> {
        self.messages.last()
    }
}

impl Notifier for StatusNotifier {
    fn notify(&mut self, message: &str, level: Level) {
        self.messages.push((message.to_string(), level));
        if self.messages.len() > 20 {
            self.messages.remove(0);
        }
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.notify(message, Level::Info);
        true
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App<S: FinanceBackend> {
    pub controller: ViewStateController<TuiChartBackend, StatusNotifier>,
    source: S,
    user_id: i64,
    pub table_state: TableState,
    advice: Option<String>,
}

impl<S: FinanceBackend> App<S> {
    pub fn new(source: S, user_id: i64) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        App {
            controller: ViewStateController::new(
                TuiChartBackend::default(),
                StatusNotifier::default(),
            ),
            source,
            user_id,
            table_state,
            advice: None,
        }
    }

    pub fn refresh(&mut self) {
        let seq = self.controller.begin_refresh();
        let result = self.source.fetch_snapshot(self.user_id);
        self.controller.complete_refresh(seq, result);

        let len = self.controller.visible_transactions().len();
        if len == 0 {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }

    /// Simulated tariff upgrade: cycle to the next tier and refetch.
    fn upgrade(&mut self) {
        use fingate::tariff::TariffTier;
        let next = match self.controller.entitlement().tier {
            TariffTier::Free => "Plus",
            TariffTier::Plus => "Business",
            TariffTier::Business => "Family",
            TariffTier::Family => "Max",
            _ => "Free",
        };
        match self.source.request_upgrade(self.user_id, next) {
            Ok(()) => {
                self.controller
                    .notifier_mut()
                    .notify(&format!("Tariff switched to {next}"), Level::Info);
                self.refresh();
            }
            Err(err) => {
                self.controller
                    .notifier_mut()
                    .notify(&format!("Upgrade failed: {err}"), Level::Error);
            }
        }
    }

    fn delete_selected(&mut self) {
        let target = self.table_state.selected().and_then(|idx| {
            self.controller
                .visible_transactions()
                .get(idx)
                .map(|tx| (tx.id, tx.description.clone()))
        });
        let Some((id, description)) = target else {
            return;
        };

        if !self
            .controller
            .notifier_mut()
            .confirm(&format!("Delete \"{description}\"?"))
        {
            return;
        }

        match self.source.delete_transaction(id) {
            Ok(()) => self.refresh(),
            Err(err) => self
                .controller
                .notifier_mut()
                .notify(&format!("Delete failed: {err}"), Level::Error),
        }
    }

    fn request_advice(&mut self) {
        if !self.controller.ai_chat_enabled() {
            self.controller
                .notifier_mut()
                .notify("AI assistant is available on the Max tariff", Level::Warn);
            return;
        }
        match self.source.fetch_advice(self.user_id) {
            Ok(text) => self.advice = Some(text),
            Err(err) => self
                .controller
                .notifier_mut()
                .notify(&format!("Advice unavailable: {err}"), Level::Error),
        }
    }

    /// Step the voice demo through its phases with one key.
    fn step_voice(&mut self) {
        if !self.controller.ai_chat_enabled() {
            self.controller
                .notifier_mut()
                .notify("Voice input is available on the Max tariff", Level::Warn);
            return;
        }
        let voice = self.controller.voice_mut();
        let _ = voice.start_listening()
            || voice.finish_capture()
            || voice.start_speaking()
            || voice.finish_speaking();
    }

    fn next_row(&mut self) {
        let len = self.controller.visible_transactions().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    fn previous_row(&mut self) {
        let len = self.controller.visible_transactions().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

pub fn run_ui<S: FinanceBackend>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {err:?}");
    }

    Ok(())
}

fn run_app<S: FinanceBackend, B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        let prev = app.controller.tab().previous();
                        app.controller.set_tab(prev);
                    } else {
                        let next = app.controller.tab().next();
                        app.controller.set_tab(next);
                    }
                }
                KeyCode::BackTab => {
                    let prev = app.controller.tab().previous();
                    app.controller.set_tab(prev);
                }
                KeyCode::Char('r') => app.refresh(),
                KeyCode::Char('u') => app.upgrade(),
                KeyCode::Char('1') if app.controller.tab() == Tab::Transactions => {
                    app.controller.set_filter(TxFilter::All);
                }
                KeyCode::Char('2') if app.controller.tab() == Tab::Transactions => {
                    app.controller.set_filter(TxFilter::Income);
                }
                KeyCode::Char('3') if app.controller.tab() == Tab::Transactions => {
                    app.controller.set_filter(TxFilter::Expense);
                }
                KeyCode::Char('4') if app.controller.tab() == Tab::Transactions => {
                    app.controller.set_filter(TxFilter::Debt);
                }
                KeyCode::Char('d') if app.controller.tab() == Tab::Transactions => {
                    app.delete_selected();
                }
                KeyCode::Char('a') if app.controller.tab() == Tab::Assistant => {
                    app.request_advice();
                }
                KeyCode::Char('v') if app.controller.tab() == Tab::Assistant => {
                    app.step_voice();
                }
                KeyCode::Down | KeyCode::Char('j') => app.next_row(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_row(),
                _ => {}
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui<S: FinanceBackend>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with tabs
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.controller.tab() {
        Tab::Dashboard => render_dashboard(f, chunks[1], app),
        Tab::Transactions => render_transactions(f, chunks[1], app),
        Tab::Debts => render_debts(f, chunks[1], app),
        Tab::Analytics => render_chart_row(f, chunks[1], app, Tab::Analytics.chart_regions()),
        Tab::Goals => render_goals(f, chunks[1], app),
        Tab::Assistant => render_assistant(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut tab_spans = vec![];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *tab == app.controller.tab() {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(tab.title(), style));
    }

    let tariff = app.controller.entitlement().tier.name();
    let balance = app
        .controller
        .snapshot()
        .map(|s| format!("{:.2}", s.statistics.balance as f64 / 100.0))
        .unwrap_or_else(|| "--".to_string());
    tab_spans.push(Span::raw("   "));
    tab_spans.push(Span::styled(
        format!("[{tariff}] balance {balance}"),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(Line::from(tab_spans))
        .block(Block::default().borders(Borders::ALL).title(" Fingate "));
    f.render_widget(header, area);
}

fn render_dashboard<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let summary = match app.controller.snapshot() {
        Some(snap) => format!(
            "Income {:.2}   Expense {:.2}   Transactions {}   Debts {}",
            snap.statistics.total_income as f64 / 100.0,
            snap.statistics.total_expense as f64 / 100.0,
            snap.transactions.len(),
            snap.debts.len(),
        ),
        None => "No data loaded - press 'r' to refresh".to_string(),
    };
    let para = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).title(" Overview "));
    f.render_widget(para, rows[0]);

    render_chart_row(f, rows[1], app, Tab::Dashboard.chart_regions());
}

/// Lay the given chart slots out side by side.
fn render_chart_row<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>, ids: &[ChartId]) {
    if ids.is_empty() {
        return;
    }
    let share = (100 / ids.len() as u16).max(1);
    let constraints: Vec<Constraint> = ids.iter().map(|_| Constraint::Percentage(share)).collect();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, id) in ids.iter().enumerate() {
        render_chart_slot(f, cols[i], app, *id);
    }
}

fn render_chart_slot<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>, id: ChartId) {
    let block = Block::default().borders(Borders::ALL).title(format!(" {} ", id.title()));

    match app.controller.region_state(id) {
        RegionState::Absent => {
            let para = Paragraph::new("…").block(block);
            f.render_widget(para, area);
        }
        RegionState::Locked => {
            // Placeholder only: no figures leak into a locked slot
            let para = Paragraph::new("🔒 Locked on your tariff\nPress 'u' to upgrade")
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: true })
                .block(block.border_style(Style::default().fg(Color::DarkGray)));
            f.render_widget(para, area);
        }
        RegionState::Empty => {
            let para = Paragraph::new("No data yet")
                .style(Style::default().fg(Color::Gray))
                .block(block);
            f.render_widget(para, area);
        }
        RegionState::Live(instance) => {
            let Some(figure) = app.controller.backend().figure(instance) else {
                return;
            };
            let series = &figure.data.series[0];
            let bars: Vec<(&str, u64)> = figure
                .data
                .labels
                .iter()
                .zip(series.points.iter())
                .map(|(label, value)| (label.as_str(), value.abs() as u64))
                .collect();
            let chart = BarChart::default()
                .block(block.title(format!(" {} ({}) ", figure.id.title(), series.name)))
                .bar_width(7)
                .bar_gap(1)
                .bar_style(Style::default().fg(Color::Green))
                .value_style(Style::default().fg(Color::Black).bg(Color::Green))
                .data(&bars);
            f.render_widget(chart, area);
        }
    }
}

fn render_transactions<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let filter = app.controller.filter();
    let transactions = app.controller.visible_transactions();

    let header = Row::new(vec!["Date", "Description", "Category", "Type", "Amount"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = transactions
        .iter()
        .map(|tx| {
            let color = match tx.kind {
                TxKind::Income => Color::Green,
                TxKind::Expense => Color::Red,
                TxKind::Debt => Color::Yellow,
            };
            Row::new(vec![
                Cell::from(tx.date.to_string()),
                Cell::from(tx.description.clone()),
                Cell::from(tx.category.clone()),
                Cell::from(tx.kind.label()).style(Style::default().fg(color)),
                Cell::from(format!("{:.2}", tx.amount as f64 / 100.0)),
            ])
        })
        .collect();

    let count = rows.len();
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Length(9),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!(
        " Transactions [{}] - {count} shown │ 1 All  2 Income  3 Expense  4 Debt  d delete ",
        filter.label()
    )))
    .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_debts<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let rows: Vec<Row> = app
        .controller
        .snapshot()
        .map(|s| s.debts.as_slice())
        .unwrap_or(&[])
        .iter()
        .map(|d| {
            let (dir, color) = match d.direction {
                fingate::snapshot::DebtDirection::Owed => ("owed to you", Color::Green),
                fingate::snapshot::DebtDirection::Owing => ("you owe", Color::Red),
            };
            Row::new(vec![
                Cell::from(d.counterparty.clone()),
                Cell::from(dir).style(Style::default().fg(color)),
                Cell::from(format!("{:.2}", d.amount as f64 / 100.0)),
                Cell::from(
                    d.due_date
                        .map(|dt| dt.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["Counterparty", "Direction", "Amount", "Due"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(" Debt Ledger "));
    f.render_widget(table, cols[0]);

    render_chart_slot(f, cols[1], app, ChartId::DebtBreakdown);
}

fn render_goals<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>) {
    let goals = app
        .controller
        .snapshot()
        .map(|s| s.goals.clone())
        .unwrap_or_default();

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut constraints: Vec<Constraint> = goals.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(cols[0]);

    for (i, goal) in goals.iter().enumerate() {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", goal.name)))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(goal.progress());
        f.render_widget(gauge, slots[i]);
    }

    render_chart_slot(f, cols[1], app, ChartId::GoalProgress);
}

fn render_assistant<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>) {
    let enabled = app.controller.ai_chat_enabled();
    let mut lines = vec![
        Line::from(if enabled {
            Span::styled("AI assistant: enabled", Style::default().fg(Color::Green))
        } else {
            Span::styled(
                "AI assistant: locked on your tariff (press 'u' to upgrade)",
                Style::default().fg(Color::DarkGray),
            )
        }),
        Line::from(format!("Voice: {}", app.controller.voice().phase().label())),
        Line::from(""),
    ];

    match &app.advice {
        Some(text) => lines.push(Line::from(text.as_str())),
        None if enabled => lines.push(Line::from("Press 'a' for advice, 'v' to step voice input")),
        None => {}
    }

    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Assistant "));
    f.render_widget(para, area);
}

fn render_status_bar<S: FinanceBackend>(f: &mut Frame, area: Rect, app: &App<S>) {
    let notice = app
        .controller
        .notifier()
        .latest()
        .map(|(msg, level)| {
            let color = match level {
                Level::Info => Color::Green,
                Level::Warn => Color::Yellow,
                Level::Error => Color::Red,
            };
            Span::styled(msg.clone(), Style::default().fg(color))
        })
        .unwrap_or_else(|| Span::raw("Tab switch view │ r refresh │ u upgrade │ q quit"));

    let status = Paragraph::new(Line::from(vec![
        notice,
        Span::raw("  "),
        Span::styled(
            format!("v{}", fingate::VERSION),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}
