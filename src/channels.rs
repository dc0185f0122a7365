//! Channel naming and channel-type classification for Nihon Kohden EDF
//! exports.
//!
//! Nihon Kohden writes labels such as `"POL R A1-Ref"`. A label is cleaned
//! down to `"RA1"` and then classified by substring containment against a
//! few fixed vocabularies. Anything that matches no vocabulary is scalp EEG.

use std::fmt;

/// Intracranial contacts: orbitofrontal, subgenual cingulate, amygdala,
/// hippocampus and ventral capsule leads.
pub const IEEG_LABELS: &[&str] = &["OFC", "SGC", "RA", "LA", "RH", "LH", "VC"];
pub const TTL_LABELS: &[&str] = &["DC"];
/// EOG is pooled with EKG until it gets a series of its own.
pub const EKG_LABELS: &[&str] = &["EKG", "EOG"];
pub const EMG_LABELS: &[&str] = &["EMG"];

const VENDOR_PREFIX: &str = "POL ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelType {
    IntracranialEeg,
    ScalpEeg,
    Ekg,
    Ttl,
    Emg,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::IntracranialEeg => "intracranial EEG",
            ChannelType::ScalpEeg => "scalp EEG",
            ChannelType::Ekg => "EKG",
            ChannelType::Ttl => "TTL",
            ChannelType::Emg => "EMG",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strips the reference suffix, the `POL ` vendor prefix and every space.
///
/// ```
/// use nkhdf5::channels::clean_channel_name;
///
/// assert_eq!(clean_channel_name("POL R A1-Ref"), "RA1");
/// assert_eq!(clean_channel_name("POL EKG"), "EKG");
/// assert_eq!(clean_channel_name("Fp1"), "Fp1");
/// ```
pub fn clean_channel_name(raw: &str) -> String {
    let before_ref = raw.split('-').next().unwrap_or("");
    let name = before_ref.strip_prefix(VENDOR_PREFIX).unwrap_or(before_ref);
    name.chars().filter(|c| *c != ' ').collect()
}

/// Classifies cleaned names. Later vocabularies win when several match,
/// in the order iEEG, TTL, EKG, EMG.
pub fn classify_channels<S: AsRef<str>>(names: &[S]) -> Vec<ChannelType> {
    names.iter().map(|n| classify_channel(n.as_ref())).collect()
}

pub fn classify_channel(name: &str) -> ChannelType {
    let matches = |vocab: &[&str]| vocab.iter().any(|label| name.contains(label));

    if matches(EMG_LABELS) {
        ChannelType::Emg
    } else if matches(EKG_LABELS) {
        ChannelType::Ekg
    } else if matches(TTL_LABELS) {
        ChannelType::Ttl
    } else if matches(IEEG_LABELS) {
        ChannelType::IntracranialEeg
    } else {
        ChannelType::ScalpEeg
    }
}

pub fn count_of_type(types: &[ChannelType], ty: ChannelType) -> usize {
    types.iter().filter(|t| **t == ty).count()
}

/// Splits a cleaned name after every run of ASCII letters.
///
/// ```
/// use nkhdf5::channels::channel_label_parts;
///
/// assert_eq!(channel_label_parts("LA10"), vec!["LA", "10"]);
/// assert_eq!(channel_label_parts("EKG"), vec!["EKG", ""]);
/// ```
pub fn channel_label_parts(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let run_ends = c.is_ascii_alphabetic()
            && !chars.peek().map_or(false, |next| next.is_ascii_alphabetic());
        if run_ends {
            parts.push(std::mem::take(&mut current));
        }
    }
    parts.push(current);
    parts
}
