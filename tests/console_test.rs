use std::sync::Arc;

use reproui::config::DeskConfig;
use reproui::console::Console;
use reproui::demo;
use reproui::lifecycle::DeskSystem;
use reproui::schema::Column;
use sync_framework::mock::MemoryTable;
use sync_framework::Cell;

/// Drives a whole operator session from scripted input against the offline sheet.
#[tokio::test]
async fn test_console_session() {
    let config = DeskConfig::offline();
    let table = Arc::new(demo::offline_table(&config.sheet));
    let (system, events) = DeskSystem::start(table.clone(), &config);

    let input: &[u8] = b"list\n\
        toggle 0 approved\n\
        set 1 paid on\n\
        show 3\n\
        toggle 4 paid\n\
        flush\n\
        state\n\
        quit\n\
        list\n";
    let mut out = Vec::new();
    Console::new(system.client.clone(), &mut out)
        .run(input, events)
        .await;
    system.shutdown().await.unwrap();

    let text = String::from_utf8(out).unwrap();
    // completed order #0003 is hidden
    assert!(text.contains("#0001"));
    assert!(!text.contains("#0003  Pedro"));
    assert!(text.contains("[0] #0001  Jose M."));
    assert!(text.contains("check membership"));
    assert!(text.contains("error: Order not found: row_4"));
    assert!(text.contains("2 row(s) written"));
    assert!(text.contains("idle"));

    assert_eq!(
        table.cell(2, Column::Approved.index()),
        Cell::Bool(true)
    );
    assert_eq!(table.cell(3, Column::Paid.index()), Cell::Bool(true));
}

#[tokio::test]
async fn test_console_reports_unreachable_sheet() {
    let config = DeskConfig {
        sheet: "Pedidos".to_string(),
        ..DeskConfig::offline()
    };
    // the table only knows HojaA, so every read fails
    let table = MemoryTable::new(Some("HojaA"), demo::sample_sheet());
    let (system, events) = DeskSystem::start(table, &config);

    let input: &[u8] = b"refresh\nlist\nquit\n";
    let mut out = Vec::new();
    Console::new(system.client.clone(), &mut out)
        .run(input, events)
        .await;
    system.shutdown().await.unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("error: Remote call failed"));
    assert!(text.contains("no pending orders"));
}
