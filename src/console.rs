//! # Console Front End
//!
//! A line-oriented stand-in for the order panel. It lists pending orders, shows the
//! detail of one order, and toggles its four flags. Scheduler events (refreshes,
//! saves, failures) are printed as they arrive.
//!
//! ```text
//! > list
//! [0] #0001  Jose M.               [ ] approved  [ ] printed  [ ] picked-up  [ ] paid
//! > toggle 0 approved
//! [0] #0001  Jose M.               [x] approved  [ ] printed  [ ] picked-up  [ ] paid
//! saved 1 row(s)
//! ```

use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;
use sync_framework::{ActorClient, SyncEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::clients::OrderDeskClient;
use crate::error::DeskError;
use crate::lifecycle::DeskEvent;
use crate::model::{Flag, Order, RowId};

pub const HELP: &str = "\
commands:
  list                         pending orders
  show <row>                   order detail
  toggle <row> <flag>          flip a flag (approved, printed, picked-up, paid)
  set <row> <flag> <on|off>    set a flag
  refresh                      re-read the spreadsheet now
  flush                        save pending changes now
  state                        scheduler state
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show(RowId),
    Toggle(RowId, Flag),
    Set(RowId, Flag, bool),
    Refresh,
    Flush,
    State,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["list" | "ls"] => Ok(Command::List),
            ["show", row] => Ok(Command::Show(row.parse()?)),
            ["toggle", row, flag] => Ok(Command::Toggle(row.parse()?, flag.parse()?)),
            ["set", row, flag, value] => {
                let value = match *value {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    other => return Err(format!("Expected on or off, got '{}'", other)),
                };
                Ok(Command::Set(row.parse()?, flag.parse()?, value))
            }
            ["refresh"] => Ok(Command::Refresh),
            ["flush" | "save"] => Ok(Command::Flush),
            ["state"] => Ok(Command::State),
            ["help" | "?"] => Ok(Command::Help),
            ["quit" | "exit" | "q"] => Ok(Command::Quit),
            [] => Err("Empty command".to_string()),
            _ => Err(format!("Unknown command '{}' (try help)", line.trim())),
        }
    }
}

/// One line per order.
pub fn render_summary(order: &Order) -> String {
    let mut line = format!("[{}] {:<6} {:<20}", order.row.0, order.ref_label(), order.name);
    for flag in Flag::ALL {
        let mark = if order.flag(flag) { 'x' } else { ' ' };
        let _ = write!(line, "  [{}] {}", mark, flag);
    }
    line
}

/// Pending orders in sheet order; completed ones are left out.
pub fn render_list(orders: &[Order]) -> String {
    let visible: Vec<String> = orders
        .iter()
        .filter(|order| !order.is_complete())
        .map(render_summary)
        .collect();
    if visible.is_empty() {
        "no pending orders".to_string()
    } else {
        visible.join("\n")
    }
}

/// The detail panel of a selected order.
pub fn render_detail(order: &Order) -> String {
    format!(
        "{} {}\n  {} | {}\n  Layer height: {}   Rigidity: {}/5   Material: {}\n  Printer: {}   Weight: {}   Time: {}   Price: {}\n{}",
        order.ref_label(),
        order.name,
        order.member_lookup.label(),
        order.comment,
        order.layer_height,
        order.rigidity,
        order.colour_material,
        order.printer,
        order.weight,
        order.time,
        order.price,
        render_summary(order),
    )
}

/// The console session. Owns a clone of the desk client.
pub struct Console<W: Write> {
    client: OrderDeskClient,
    out: W,
    last_listed: Vec<Order>,
}

impl<W: Write> Console<W> {
    pub fn new(client: OrderDeskClient, out: W) -> Self {
        Self {
            client,
            out,
            last_listed: Vec::new(),
        }
    }

    /// Reads commands until `quit` or end of input, printing events in between.
    pub async fn run<R>(mut self, input: R, mut events: mpsc::Receiver<DeskEvent>)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        self.print(HELP);
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Console input failed");
                        break;
                    }
                },
                Some(event) = events.recv() => self.on_event(event),
            }
        }
        debug!("Console closed");
    }

    /// Returns `false` once the operator asked to quit.
    pub async fn handle_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                self.print(&e);
                return true;
            }
        };
        match self.execute(command).await {
            Ok(keep_going) => keep_going,
            Err(e) => {
                self.print(&format!("error: {}", e));
                true
            }
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<bool, DeskError> {
        match command {
            Command::List => {
                let orders = self.client.pending_orders().await?;
                self.print(&render_list(&orders));
            }
            Command::Show(row) => {
                let order = self.client.select(row).await?;
                self.print(&render_detail(&order));
            }
            Command::Toggle(row, flag) => {
                let order = self.client.toggle_flag(row, flag).await?;
                self.print(&render_summary(&order));
            }
            Command::Set(row, flag, value) => {
                let order = self.client.set_flag(row, flag, value).await?;
                self.print(&render_summary(&order));
            }
            Command::Refresh => {
                let size = self.client.refresh().await?;
                self.print(&format!("{} order(s) loaded", size));
            }
            Command::Flush => {
                let rows = self.client.flush().await?;
                self.print(&format!("{} row(s) written", rows));
            }
            Command::State => {
                let state = self.client.current_state();
                self.print(&state.to_string());
            }
            Command::Help => self.print(HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    pub fn on_event(&mut self, event: DeskEvent) {
        match event {
            SyncEvent::Refreshed(orders) => {
                // Polls that change nothing stay quiet
                if orders != self.last_listed {
                    self.print(&render_list(&orders));
                    self.last_listed = orders;
                }
            }
            SyncEvent::Flushed { rows } => self.print(&format!("saved {} row(s)", rows)),
            SyncEvent::FetchFailed(msg) => {
                self.print(&format!("could not refresh, showing previous orders: {}", msg))
            }
            SyncEvent::FlushFailed(msg) => {
                self.print(&format!("could not save, will retry: {}", msg))
            }
        }
    }

    fn print(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            warn!(error = %e, "Console output failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use sync_framework::mock::create_mock_client;

    #[test]
    fn test_parse_commands() {
        assert_eq!("list".parse::<Command>(), Ok(Command::List));
        assert_eq!("show 3".parse::<Command>(), Ok(Command::Show(RowId(3))));
        assert_eq!(
            "toggle row_2 picked-up".parse::<Command>(),
            Ok(Command::Toggle(RowId(2), Flag::PickedUp))
        );
        assert_eq!(
            "set 1 paid on".parse::<Command>(),
            Ok(Command::Set(RowId(1), Flag::Paid, true))
        );
        assert_eq!("  quit ".parse::<Command>(), Ok(Command::Quit));
        assert!("set 1 paid maybe".parse::<Command>().is_err());
        assert!("toggle x approved".parse::<Command>().is_err());
        assert!("print 3".parse::<Command>().is_err());
    }

    #[test]
    fn test_render_summary_and_list() {
        let mut order = demo::sample_order(RowId(0));
        order.printed = true;
        let line = render_summary(&order);
        assert!(line.starts_with("[0] #0001"));
        assert!(line.contains("[ ] approved"));
        assert!(line.contains("[x] printed"));

        let mut done = demo::sample_order(RowId(1));
        done.completion = 1.0;
        let list = render_list(&[order, done]);
        assert_eq!(list.lines().count(), 1);
        assert_eq!(render_list(&[]), "no pending orders");
    }

    #[test]
    fn test_render_detail() {
        let detail = render_detail(&demo::sample_order(RowId(0)));
        assert!(detail.contains("verified member | Comentario 01"));
        assert!(detail.contains("Rigidity: 3/5"));
        assert!(detail.contains("Material: PLA-Negro"));
    }

    #[test]
    fn test_events_are_printed() {
        let (client, _receiver) = create_mock_client(4);
        let mut out = Vec::new();
        let mut console = Console::new(OrderDeskClient::new(client), &mut out);

        let orders = vec![demo::sample_order(RowId(0))];
        console.on_event(SyncEvent::Refreshed(orders.clone()));
        // an identical poll result is not printed again
        console.on_event(SyncEvent::Refreshed(orders));
        console.on_event(SyncEvent::Flushed { rows: 2 });
        console.on_event(SyncEvent::FetchFailed("HTTP 503".to_string()));
        drop(console);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("#0001").count(), 1);
        assert!(text.contains("saved 2 row(s)"));
        assert!(text.contains("could not refresh, showing previous orders: HTTP 503"));
    }

    #[tokio::test]
    async fn test_bad_input_keeps_the_session_alive() {
        let (client, _receiver) = create_mock_client(4);
        let mut out = Vec::new();
        let mut console = Console::new(OrderDeskClient::new(client), &mut out);

        assert!(console.handle_line("launch rockets").await);
        assert!(console.handle_line("").await);
        assert!(!console.handle_line("quit").await);
        drop(console);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unknown command 'launch rockets'"));
    }
}
