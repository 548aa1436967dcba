//! The interactive dashboard: one poller per widget, a crossterm event
//! loop, and the ratatui rendering for every panel.

use crate::{
    api::ApiClient,
    config::Config,
    input::InputEvent,
    logger::DetectionLogger,
    model::{
        self, derive_distribution, format_timestamp, ConfidencePoint, DistributionSlice,
        Paginated, RecordFilter, StatsReport, TrendPoint, WasteRecord, WasteType, WasteTypeMap,
    },
    poll::{FetchFn, Phase, Poller},
    validation::{MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL},
};
use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, Gauge, GraphType, List, ListItem,
        Paragraph, Row, Table, TableState, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardPanel {
    Overview,
    Analytics,
    Live,
    History,
}

impl DashboardPanel {
    pub fn all() -> Vec<Self> {
        vec![Self::Overview, Self::Analytics, Self::Live, Self::History]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Analytics => "Analytics",
            Self::Live => "Live",
            Self::History => "History",
        }
    }
}

/// Types plus the stats report; the stat cards need both in one snapshot.
#[derive(Debug, Clone)]
pub struct StatsOverview {
    pub types: Vec<WasteType>,
    pub stats: StatsReport,
}

fn same_stats_overview(a: &StatsOverview, b: &StatsOverview) -> bool {
    model::same_stats(&a.stats, &b.stats)
}

/// Recent detections with the types map used to resolve names and colors.
#[derive(Debug, Clone)]
pub struct RecentFeed {
    pub types: WasteTypeMap,
    pub records: Vec<WasteRecord>,
}

fn same_recent_feed(a: &RecentFeed, b: &RecentFeed) -> bool {
    model::same_records(&a.records, &b.records)
}

/// The 7-day trend series plus the types that label its lines.
#[derive(Debug, Clone)]
pub struct TrendView {
    pub types: Vec<WasteType>,
    pub points: Vec<TrendPoint>,
}

fn same_trend_view(a: &TrendView, b: &TrendView) -> bool {
    model::same_trend(&a.points, &b.points)
}

fn same_distribution(a: &Vec<DistributionSlice>, b: &Vec<DistributionSlice>) -> bool {
    model::same_distribution(a, b)
}

fn same_confidence(a: &Vec<ConfidencePoint>, b: &Vec<ConfidencePoint>) -> bool {
    model::same_confidence(a, b)
}

fn same_history_page(a: &Paginated<WasteRecord>, b: &Paginated<WasteRecord>) -> bool {
    a.count == b.count
        && a.current_page == b.current_page
        && model::same_records(&a.results, &b.results)
}

pub struct DashboardState {
    pub active_panel: DashboardPanel,
    pub panel_index: usize,
    pub paused: bool,
    pub show_help: bool,
    pub table_state: TableState,
    pub history_filter: RecordFilter,
    pub stats: Poller<StatsOverview>,
    pub distribution: Poller<Vec<DistributionSlice>>,
    pub confidence: Poller<Vec<ConfidencePoint>>,
    pub trend: Poller<TrendView>,
    pub recent: Poller<RecentFeed>,
    pub history: Poller<Paginated<WasteRecord>>,
    client: ApiClient,
}

impl DashboardState {
    pub fn new(client: ApiClient, config: &Config, history_filter: RecordFilter) -> Self {
        let interval = Duration::from_millis(config.refresh_interval);
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        let stats = Poller::new(stats_fetch(&client), same_stats_overview, interval);
        let distribution = Poller::new(distribution_fetch(&client), same_distribution, interval);
        let confidence = Poller::new(confidence_fetch(&client), same_confidence, interval);
        let trend = Poller::new(trend_fetch(&client), same_trend_view, interval);
        let recent = Poller::new(
            recent_fetch(&client, config.recent_limit),
            same_recent_feed,
            interval,
        );
        let history = Poller::new(
            history_fetch(&client, history_filter.clone()),
            same_history_page,
            interval,
        );

        Self {
            active_panel: DashboardPanel::Overview,
            panel_index: 0,
            paused: false,
            show_help: false,
            table_state,
            history_filter,
            stats,
            distribution,
            confidence,
            trend,
            recent,
            history,
            client,
        }
    }

    pub fn next_panel(&mut self) {
        let panels = DashboardPanel::all();
        self.panel_index = (self.panel_index + 1) % panels.len();
        self.active_panel = panels[self.panel_index].clone();
        self.table_state.select(Some(0));
    }

    pub fn prev_panel(&mut self) {
        let panels = DashboardPanel::all();
        self.panel_index = if self.panel_index == 0 {
            panels.len() - 1
        } else {
            self.panel_index - 1
        };
        self.active_panel = panels[self.panel_index].clone();
        self.table_state.select(Some(0));
    }

    pub fn next_item(&mut self, max_items: usize) {
        if max_items > 0 {
            let selected = self.table_state.selected().unwrap_or(0);
            self.table_state.select(Some((selected + 1) % max_items));
        }
    }

    pub fn prev_item(&mut self, max_items: usize) {
        if max_items > 0 {
            let selected = self.table_state.selected().unwrap_or(0);
            let previous = if selected == 0 { max_items - 1 } else { selected - 1 };
            self.table_state.select(Some(previous));
        }
    }

    /// Page navigation reconfigures the history poller: the in-flight
    /// request is orphaned and exactly one fetch goes out with the new
    /// page number.
    pub fn next_history_page(&mut self) {
        let has_next = self
            .history
            .data()
            .map(|page| page.current_page < page.total_pages || page.next.is_some())
            .unwrap_or(false);
        if has_next {
            let page = self.history_filter.page.unwrap_or(1);
            self.history_filter.page = Some(page + 1);
            self.reconfigure_history();
        }
    }

    pub fn prev_history_page(&mut self) {
        let page = self.history_filter.page.unwrap_or(1);
        if page > 1 {
            self.history_filter.page = Some(page - 1);
            self.reconfigure_history();
        }
    }

    fn reconfigure_history(&mut self) {
        self.table_state.select(Some(0));
        self.history
            .reconfigure(history_fetch(&self.client, self.history_filter.clone()));
    }

    pub fn tick_all(&mut self) {
        self.stats.tick();
        self.distribution.tick();
        self.confidence.tick();
        self.trend.tick();
        self.recent.tick();
        self.history.tick();
    }

    /// Applies completed fetches across every widget; true means redraw.
    pub fn drain_all(&mut self) -> bool {
        let mut changed = false;
        changed |= self.stats.drain();
        changed |= self.distribution.drain();
        changed |= self.confidence.drain();
        changed |= self.trend.drain();
        changed |= self.recent.drain();
        changed |= self.history.drain();
        changed
    }

    pub fn refresh_all(&mut self) {
        self.stats.force_refresh();
        self.distribution.force_refresh();
        self.confidence.force_refresh();
        self.trend.force_refresh();
        self.recent.force_refresh();
        self.history.force_refresh();
    }

    pub fn set_refresh_interval(&mut self, interval_ms: u64) {
        let interval = Duration::from_millis(interval_ms);
        self.stats.set_interval(interval);
        self.distribution.set_interval(interval);
        self.confidence.set_interval(interval);
        self.trend.set_interval(interval);
        self.recent.set_interval(interval);
        self.history.set_interval(interval);
    }

    pub fn shutdown_all(&mut self) {
        self.stats.shutdown();
        self.distribution.shutdown();
        self.confidence.shutdown();
        self.trend.shutdown();
        self.recent.shutdown();
        self.history.shutdown();
    }

    pub fn media_url(&self, image: &str) -> String {
        self.client.media_url(image)
    }
}

fn stats_fetch(client: &ApiClient) -> FetchFn<StatsOverview> {
    let client = client.clone();
    Arc::new(move || {
        let types = client.waste_types()?;
        let stats = client.waste_stats()?;
        Ok(StatsOverview { types, stats })
    })
}

fn distribution_fetch(client: &ApiClient) -> FetchFn<Vec<DistributionSlice>> {
    let client = client.clone();
    Arc::new(move || client.waste_distribution())
}

fn confidence_fetch(client: &ApiClient) -> FetchFn<Vec<ConfidencePoint>> {
    let client = client.clone();
    Arc::new(move || client.waste_confidence())
}

fn trend_fetch(client: &ApiClient) -> FetchFn<TrendView> {
    let client = client.clone();
    Arc::new(move || {
        let types = client.waste_types()?;
        let points = client.waste_over_time()?;
        Ok(TrendView { types, points })
    })
}

fn recent_fetch(client: &ApiClient, limit: u32) -> FetchFn<RecentFeed> {
    let client = client.clone();
    Arc::new(move || {
        let types = client.types_map()?;
        let records = client.recent_detections(limit)?;
        Ok(RecentFeed { types, records })
    })
}

fn history_fetch(client: &ApiClient, filter: RecordFilter) -> FetchFn<Paginated<WasteRecord>> {
    let client = client.clone();
    Arc::new(move || client.waste_records(&filter))
}

pub fn run_dashboard(
    client: ApiClient,
    mut config: Config,
    history_filter: RecordFilter,
    log_file: Option<String>,
) -> Result<()> {
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut state = DashboardState::new(client, &config, history_filter);
    let mut logger = if log_file.is_some() {
        Some(DetectionLogger::new(log_file)?)
    } else {
        None
    };

    let mut needs_redraw = true;

    loop {
        let poll_interval = (config.refresh_interval / 10).clamp(50, 250);
        if event::poll(Duration::from_millis(poll_interval))? {
            if let Event::Key(key) = event::read()? {
                match InputEvent::from_key_event(key) {
                    InputEvent::Quit => break,
                    InputEvent::NextPanel => {
                        state.next_panel();
                        needs_redraw = true;
                    }
                    InputEvent::PrevPanel => {
                        state.prev_panel();
                        needs_redraw = true;
                    }
                    InputEvent::NextItem => {
                        if state.active_panel == DashboardPanel::History {
                            let rows = state
                                .history
                                .data()
                                .map(|page| page.results.len())
                                .unwrap_or(0);
                            state.next_item(rows);
                            needs_redraw = true;
                        }
                    }
                    InputEvent::PrevItem => {
                        if state.active_panel == DashboardPanel::History {
                            let rows = state
                                .history
                                .data()
                                .map(|page| page.results.len())
                                .unwrap_or(0);
                            state.prev_item(rows);
                            needs_redraw = true;
                        }
                    }
                    InputEvent::NextPage => {
                        if state.active_panel == DashboardPanel::History {
                            state.next_history_page();
                            needs_redraw = true;
                        }
                    }
                    InputEvent::PrevPage => {
                        if state.active_panel == DashboardPanel::History {
                            state.prev_history_page();
                            needs_redraw = true;
                        }
                    }
                    InputEvent::Pause => {
                        state.paused = !state.paused;
                        needs_redraw = true;
                    }
                    InputEvent::Refresh => {
                        state.refresh_all();
                        needs_redraw = true;
                    }
                    InputEvent::ShowHelp => {
                        state.show_help = !state.show_help;
                        needs_redraw = true;
                    }
                    InputEvent::SaveSettings => {
                        config.save().ok();
                    }
                    InputEvent::ReloadSettings => {
                        config = Config::load().unwrap_or_default();
                        state.set_refresh_interval(config.refresh_interval);
                        needs_redraw = true;
                    }
                    InputEvent::IncreaseRefresh => {
                        config.refresh_interval =
                            (config.refresh_interval / 2).max(MIN_REFRESH_INTERVAL);
                        state.set_refresh_interval(config.refresh_interval);
                        needs_redraw = true;
                    }
                    InputEvent::DecreaseRefresh => {
                        config.refresh_interval =
                            (config.refresh_interval * 2).min(MAX_REFRESH_INTERVAL);
                        state.set_refresh_interval(config.refresh_interval);
                        needs_redraw = true;
                    }
                    _ => {}
                }
            }
        }

        if !state.paused {
            state.tick_all();
        }

        if state.drain_all() {
            needs_redraw = true;
            if let Some(logger) = logger.as_mut() {
                if let Some(feed) = state.recent.data().cloned() {
                    logger.log_detections(&feed.records)?;
                }
            }
        }

        if needs_redraw {
            terminal.draw(|f| draw_dashboard(f, &mut state))?;
            needs_redraw = false;
        }
    }

    state.shutdown_all();
    Ok(())
}

fn draw_dashboard(f: &mut Frame, state: &mut DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with tabs
            Constraint::Length(6), // Stat cards
            Constraint::Min(0),    // Panel content
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_header(f, chunks[0], state);
    draw_stat_cards(f, chunks[1], state);

    match state.active_panel {
        DashboardPanel::Overview => draw_overview_panel(f, chunks[2], state),
        DashboardPanel::Analytics => draw_analytics_panel(f, chunks[2], state),
        DashboardPanel::Live => draw_live_panel(f, chunks[2], state),
        DashboardPanel::History => draw_history_panel(f, chunks[2], state),
    }

    draw_footer(f, chunks[3], state);

    if state.show_help {
        draw_help_overlay(f);
    }
}

fn draw_header(f: &mut Frame, area: Rect, state: &DashboardState) {
    let panels = DashboardPanel::all();
    let titles: Vec<Line> = panels.iter().map(|p| Line::from(p.title())).collect();

    let title = if state.paused {
        "wastewatch [PAUSED]"
    } else {
        "wastewatch"
    };

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .select(state.panel_index);

    f.render_widget(tabs, area);
}

/// Total card plus one card per waste type, counts and share of total.
fn draw_stat_cards(f: &mut Frame, area: Rect, state: &DashboardState) {
    let Some(overview) = state.stats.data().cloned() else {
        let notice = match state.stats.phase() {
            Phase::Error => Paragraph::new(state.stats.error().unwrap_or("fetch failed"))
                .style(Style::default().fg(Color::Red)),
            _ => Paragraph::new("Loading waste statistics...")
                .style(Style::default().fg(Color::Yellow)),
        };
        f.render_widget(notice.block(Block::default().borders(Borders::ALL)), area);
        return;
    };

    // One card per type plus the total; clamp to keep cards readable.
    let card_count = (overview.types.len() + 1).min(6);
    let constraints: Vec<Constraint> =
        vec![Constraint::Ratio(1, card_count as u32); card_count];
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let total = overview.stats.total_items();
    let total_card = Paragraph::new(vec![
        Line::from(Span::styled(
            total.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "items classified",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().borders(Borders::ALL).title("Total Waste"));
    f.render_widget(total_card, cards[0]);

    let slices = derive_distribution(&overview.types, &overview.stats);
    for (slice, card_area) in slices.iter().zip(cards.iter().skip(1)) {
        let color = type_color(&slice.color);
        let card = Paragraph::new(vec![
            Line::from(Span::styled(
                slice.value.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{}% of total", slice.percentage),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(slice.name.clone())
                .border_style(Style::default().fg(color)),
        );
        f.render_widget(card, *card_area);
    }
}

fn draw_overview_panel(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    draw_distribution_chart(f, chunks[0], state);
    draw_recent_detections(f, chunks[1], state);
}

/// Horizontal bars, one per type, item counts with share of total.
fn draw_distribution_chart(f: &mut Frame, area: Rect, state: &DashboardState) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .title("Waste Distribution");
    if let Some(error) = state.distribution.error() {
        block = block.title_bottom(error_notice(error));
    }

    let Some(slices) = state.distribution.data().cloned() else {
        draw_placeholder(f, area, block, state.distribution.phase());
        return;
    };

    if slices.is_empty() {
        f.render_widget(
            Paragraph::new("No data available")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let max_value = slices.iter().map(|s| s.value).max().unwrap_or(1).max(1);
    let bar_width = area.width.saturating_sub(30).max(10) as u64;

    let lines: Vec<Line> = slices
        .iter()
        .map(|slice| {
            let color = type_color(&slice.color);
            let filled = (slice.value * bar_width / max_value) as usize;
            Line::from(vec![
                Span::styled(format!("{:<12}", truncate(&slice.name, 12)), Style::default()),
                Span::styled("█".repeat(filled.max(usize::from(slice.value > 0))), Style::default().fg(color)),
                Span::styled(
                    format!(" {} ({}%)", slice.value, slice.percentage),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_recent_detections(f: &mut Frame, area: Rect, state: &DashboardState) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .title("Recent Detections");
    if let Some(error) = state.recent.error() {
        block = block.title_bottom(error_notice(error));
    }

    let Some(feed) = state.recent.data().cloned() else {
        draw_placeholder(f, area, block, state.recent.phase());
        return;
    };

    if feed.records.is_empty() {
        f.render_widget(
            Paragraph::new("No recent detections")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = feed
        .records
        .iter()
        .map(|record| {
            let color = type_color(feed.types.color(&record.type_label));
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10}", truncate(&feed.types.display_name(&record.type_label), 10)),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{:>4}%  ", record.confidence)),
                Span::styled(
                    format_timestamp(&record.timestamp),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn draw_analytics_panel(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    draw_confidence_chart(f, chunks[0], state);
    draw_trend_chart(f, chunks[1], state);
}

/// Average classification confidence per type, on a fixed 0-100 scale.
fn draw_confidence_chart(f: &mut Frame, area: Rect, state: &DashboardState) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .title("Avg. Confidence by Type");
    if let Some(error) = state.confidence.error() {
        block = block.title_bottom(error_notice(error));
    }

    let Some(points) = state.confidence.data().cloned() else {
        draw_placeholder(f, area, block, state.confidence.phase());
        return;
    };

    if points.is_empty() {
        f.render_widget(
            Paragraph::new("No data available")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let bar_width = area.width.saturating_sub(30).max(10) as u64;
    let lines: Vec<Line> = points
        .iter()
        .map(|point| {
            let color = type_color(&point.color);
            let filled = (u64::from(point.confidence) * bar_width / 100) as usize;
            Line::from(vec![
                Span::styled(format!("{:<12}", truncate(&point.name, 12)), Style::default()),
                Span::styled("█".repeat(filled), Style::default().fg(color)),
                Span::styled(
                    format!(" {}%", point.confidence),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Braille line chart of the last 7 days, one line per waste type.
fn draw_trend_chart(f: &mut Frame, area: Rect, state: &DashboardState) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .title("Waste Over Time (7 days)");
    if let Some(error) = state.trend.error() {
        block = block.title_bottom(error_notice(error));
    }

    let Some(trend) = state.trend.data().cloned() else {
        draw_placeholder(f, area, block, state.trend.phase());
        return;
    };

    if trend.points.is_empty() || trend.types.is_empty() {
        f.render_widget(
            Paragraph::new("No data available")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let series: Vec<(String, Color, Vec<(f64, f64)>)> = trend
        .types
        .iter()
        .map(|waste_type| {
            let data: Vec<(f64, f64)> = trend
                .points
                .iter()
                .enumerate()
                .map(|(i, point)| (i as f64, point.count_for(&waste_type.label) as f64))
                .collect();
            (
                waste_type.display_name.clone(),
                type_color(&waste_type.color),
                data,
            )
        })
        .collect();

    let max_y = trend
        .points
        .iter()
        .flat_map(|point| point.counts.values())
        .copied()
        .max()
        .unwrap_or(1)
        .max(1) as f64;

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|(name, color, data)| {
            Dataset::default()
                .name(name.as_str())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(*color))
                .data(data)
        })
        .collect();

    let first_date = trend.points.first().map(|p| p.date.clone()).unwrap_or_default();
    let last_date = trend.points.last().map(|p| p.date.clone()).unwrap_or_default();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, (trend.points.len().saturating_sub(1)).max(1) as f64])
                .labels(vec![first_date, last_date]),
        )
        .y_axis(
            Axis::default()
                .title("Items")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, max_y])
                .labels(vec!["0".to_string(), format!("{}", max_y as u64)]),
        );

    f.render_widget(chart, area);
}

/// Latest detection, rendered large with a confidence gauge. Polling is
/// shared with the recent-detections feed.
fn draw_live_panel(f: &mut Frame, area: Rect, state: &DashboardState) {
    let mut block = Block::default().borders(Borders::ALL).title("Live Camera View");
    if let Some(error) = state.recent.error() {
        block = block.title_bottom(error_notice(error));
    }

    let Some(feed) = state.recent.data().cloned() else {
        draw_placeholder(f, area, block, state.recent.phase());
        return;
    };

    let Some(latest) = feed.records.first() else {
        f.render_widget(
            Paragraph::new("No detections yet")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    };

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let color = type_color(feed.types.color(&latest.type_label));
    let display_name = feed.types.display_name(&latest.type_label);
    let detail = Paragraph::new(vec![
        Line::from(vec![
            Span::raw("Detected: "),
            Span::styled(
                format!("{display_name} Waste"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("At:       "),
            Span::raw(format_timestamp(&latest.timestamp)),
        ]),
        Line::from(vec![
            Span::raw("Image:    "),
            Span::styled(
                state.media_url(&latest.image),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
    ]);
    f.render_widget(detail, chunks[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Confidence"))
        .gauge_style(Style::default().fg(color))
        .percent(u16::from(latest.confidence.min(100)));
    f.render_widget(gauge, chunks[1]);

    let hint = if state.paused {
        "Paused - press Space to resume"
    } else {
        "Press Space to pause the feed"
    };
    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn draw_history_panel(f: &mut Frame, area: Rect, state: &mut DashboardState) {
    let filter = &state.history_filter;
    let mut filter_notes = Vec::new();
    if !filter.waste_types.is_empty() {
        filter_notes.push(filter.waste_types.join(","));
    }
    if let Some(start) = &filter.start_date {
        filter_notes.push(format!("from {start}"));
    }
    if let Some(end) = &filter.end_date {
        filter_notes.push(format!("to {end}"));
    }
    let title = if filter_notes.is_empty() {
        "Detection History".to_string()
    } else {
        format!("Detection History [{}]", filter_notes.join(" "))
    };

    let mut block = Block::default().borders(Borders::ALL).title(title);
    if let Some(error) = state.history.error() {
        block = block.title_bottom(error_notice(error));
    }

    let Some(page) = state.history.data().cloned() else {
        draw_placeholder(f, area, block, state.history.phase());
        return;
    };

    if page.results.is_empty() {
        f.render_widget(
            Paragraph::new("No records match the current filter")
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let types = state
        .recent
        .data()
        .map(|feed| feed.types.clone())
        .unwrap_or_default();

    let header = Row::new(vec!["ID", "Type", "Confidence", "Timestamp", "Image"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = page
        .results
        .iter()
        .map(|record| {
            let color = type_color(types.color(&record.type_label));
            Row::new(vec![
                Cell::from(record.id.to_string()),
                Cell::from(types.display_name(&record.type_label))
                    .style(Style::default().fg(color)),
                Cell::from(format!("{}%", record.confidence)),
                Cell::from(format_timestamp(&record.timestamp)),
                Cell::from(record.image.clone()),
            ])
        })
        .collect();

    let pagination = format!(
        " Page {}/{} · {} records · ←/→ to change page ",
        page.current_page.max(1),
        page.total_pages.max(1),
        page.count
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block.title_bottom(Line::from(pagination)))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut state.table_state);
}

fn draw_footer(f: &mut Frame, area: Rect, state: &DashboardState) {
    let footer = Line::from(vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" panels  "),
        Span::styled("Space", Style::default().fg(Color::Yellow)),
        Span::raw(if state.paused { " resume  " } else { " pause  " }),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh  "),
        Span::styled("?", Style::default().fg(Color::Yellow)),
        Span::raw(" help  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);
    f.render_widget(Paragraph::new(footer), area);
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, area);

    let help = Paragraph::new(vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Tab / Shift+Tab   switch panel"),
        Line::from("← / →             history page"),
        Line::from("↑ / ↓             select history row"),
        Line::from("Space             pause/resume polling"),
        Line::from("r                 refresh all widgets now"),
        Line::from("< / >             slower/faster refresh"),
        Line::from("F5 / F6           save/reload config"),
        Line::from("q / Esc           quit"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"))
    .wrap(Wrap { trim: true });

    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Loading or error notice for a widget with no data yet.
fn draw_placeholder(f: &mut Frame, area: Rect, block: Block, phase: Phase) {
    let notice = match phase {
        Phase::Error => Paragraph::new("Fetch failed - retrying on the next tick")
            .style(Style::default().fg(Color::Red)),
        _ => Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow)),
    };
    f.render_widget(notice.alignment(Alignment::Center).block(block), area);
}

fn error_notice(error: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {} ", truncate(error, 60)),
        Style::default().fg(Color::Red),
    ))
}

/// Maps an API "#RRGGBB" color onto the terminal; anything unparseable
/// falls back to gray, matching the frontend badge fallback.
fn type_color(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }
    Color::Gray
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_cycle_in_order() {
        let panels = DashboardPanel::all();
        assert_eq!(panels.len(), 4);
        assert_eq!(panels[0].title(), "Overview");
        assert_eq!(panels[3].title(), "History");
    }

    #[test]
    fn hex_colors_map_to_rgb() {
        assert_eq!(type_color("#3B82F6"), Color::Rgb(0x3B, 0x82, 0xF6));
        assert_eq!(type_color("#6B7280"), Color::Rgb(0x6B, 0x72, 0x80));
        assert_eq!(type_color("teal"), Color::Gray);
        assert_eq!(type_color(""), Color::Gray);
    }

    #[test]
    fn history_pages_compare_on_page_and_records() {
        let page = |current_page, count| Paginated::<WasteRecord> {
            results: Vec::new(),
            count,
            next: None,
            previous: None,
            total_pages: 3,
            current_page,
        };
        assert!(same_history_page(&page(1, 10), &page(1, 10)));
        assert!(!same_history_page(&page(1, 10), &page(2, 10)));
        assert!(!same_history_page(&page(1, 10), &page(1, 11)));
    }

    #[test]
    fn help_overlay_rect_is_centered() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(50, 60, area);

        assert_eq!(popup.width, 50);
        assert_eq!(popup.height, 24);
        assert_eq!(popup.x, 25);
        assert_eq!(popup.y, 8);
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate("Plastic", 12), "Plastic");
        assert_eq!(truncate("Biodegradable", 6), "Biode…");
    }
}
