use crate::core::Core;
use anyhow::Result;
use cursive::align::HAlign;
use cursive::view::Nameable;
use cursive::views::{Dialog, EditView, LinearLayout, TextContent, TextView};
use cursive::Cursive;
use std::sync::Arc;
use tracing::{error, info};

/// Builds and runs the blocking cursive event loop. Runs on a
/// `spawn_blocking` thread; the async tasks push balance updates through
/// `balance_content` and read the UI's requests back out through
/// `core.tx_sender`.
pub fn run_ui(core: Arc<Core>, balance_content: TextContent) -> Result<()> {
    let mut siv = cursive::default();
    siv.set_user_data(core);

    let layout = LinearLayout::vertical()
        .child(TextView::new("good-wallet").h_align(HAlign::Center))
        .child(TextView::new_with_content(balance_content))
        .child(TextView::new("\npress 's' to send, 'q' to quit"));

    siv.add_layer(Dialog::around(layout).title("wallet"));

    siv.add_global_callback('s', open_send_dialog);
    siv.add_global_callback('q', |s| s.quit());

    info!("starting cursive event loop");
    siv.run();
    Ok(())
}

fn open_send_dialog(siv: &mut Cursive) {
    let layout = LinearLayout::vertical()
        .child(TextView::new("recipient name (from contacts):"))
        .child(EditView::new().with_name("recipient"))
        .child(TextView::new("amount (satoshis):"))
        .child(EditView::new().with_name("amount"));

    siv.add_layer(
        Dialog::around(layout)
            .title("send transaction")
            .button("send", submit_transaction)
            .button("cancel", |s| {
                s.pop_layer();
            }),
    );
}

fn submit_transaction(siv: &mut Cursive) {
    let recipient = siv
        .call_on_name("recipient", |view: &mut EditView| view.get_content())
        .map(|rc| rc.to_string())
        .unwrap_or_default();
    let amount: Option<u64> = siv
        .call_on_name("amount", |view: &mut EditView| view.get_content())
        .and_then(|rc| rc.parse().ok());

    siv.pop_layer();

    let Some(amount) = amount else {
        siv.add_layer(Dialog::info("amount must be a positive number"));
        return;
    };

    let core = siv
        .user_data::<Arc<Core>>()
        .expect("core set as user data")
        .clone();
    match core.send_transaction_async(&recipient, amount) {
        Ok(()) => siv.add_layer(Dialog::info(format!("sent {amount} satoshis to {recipient}"))),
        Err(e) => {
            error!("failed to queue transaction: {e}");
            siv.add_layer(Dialog::info(format!("error: {e}")));
        }
    }
}
