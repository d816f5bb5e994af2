/// Substrings that identify a loopback adapter across the platforms `pcap`
/// commonly runs on: Linux (`lo`), macOS/BSD (`lo0`), Windows (the NPF
/// loopback adapter's description contains "loopback").
const LOOPBACK_HINTS: [&str; 3] = ["lo0", "loopback", "lo"];

/// Picks the first device whose name or description matches a known
/// loopback hint. Returns `None` if `pcap` can't enumerate devices at all
/// (e.g. missing capture privileges) or none look like loopback.
pub fn discover_loopback_interface() -> Option<String> {
    let devices = pcap::Device::list().ok()?;
    devices
        .into_iter()
        .find(|d| {
            let name = d.name.to_lowercase();
            let desc = d
                .desc
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            LOOPBACK_HINTS.iter().any(|hint| name == *hint || desc.contains(hint))
        })
        .map(|d| d.name)
}
