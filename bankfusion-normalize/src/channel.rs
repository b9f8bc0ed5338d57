//! Payment rail detection

use crate::rules::RuleTables;
use bankfusion_core::Channel;

const LOOSE_RAILS: &[(&[&str], Channel)] = &[
    (&["UPI"], Channel::Upi),
    (&["ATM", "ATW"], Channel::Atm),
    (&["NEFT"], Channel::Neft),
    (&["RTGS"], Channel::Rtgs),
    (&["IMPS"], Channel::Imps),
    (&["POS", "CARD"], Channel::Card),
    (&["ACH"], Channel::Ach),
    (&["CASH"], Channel::Cash),
    (&["CHEQUE", "CHQ"], Channel::Cheque),
    (&["ONLINE", "BILLPAY"], Channel::Online),
];

/// First-guess channel from any rail fragment in the narration
pub fn suggest_channel(text: &str) -> Channel {
    LOOSE_RAILS
        .iter()
        .find(|(marks, _)| marks.iter().any(|m| text.contains(m)))
        .map(|(_, channel)| *channel)
        .unwrap_or(Channel::Other)
}

/// Channel from whole-word rail codes only. Merchant identity never decides it.
pub fn rail_channel(tables: &RuleTables, text: &str) -> Option<Channel> {
    tables
        .rails
        .first(text)
        .or_else(|| text.contains("ATW-").then_some(Channel::Atm))
}
