/// Format seconds as `m:ss`, minutes unpadded and seconds zero-padded
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
