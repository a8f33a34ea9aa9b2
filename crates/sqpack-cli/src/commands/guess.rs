use crate::{
    CommandContext, GuessArgs,
    output::{OutputStyle, format_hash, format_success},
};
use anyhow::Context;
use sqpack_crypto::PreimageSearch;

/// Parse `e39b7999` or `0xE39B7999`
pub fn parse_target(input: &str) -> anyhow::Result<u32> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    u32::from_str_radix(digits, 16).with_context(|| format!("Invalid hash \"{input}\""))
}

pub fn handle(args: GuessArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let target = parse_target(&args.hash)?;
    let name = PreimageSearch::new(target)
        .max_length(args.max_length)
        .prefix(args.prefix)
        .suffix(args.suffix)
        .find_or_err()?;

    if ctx.format.is_json() {
        let result = serde_json::json!({
            "hash": format!("{target:08x}"),
            "name": name,
        });
        println!("{}", ctx.format.to_json(&result)?);
    } else {
        let style = OutputStyle::new();
        println!(
            "{} {}",
            format_hash(&format!("{target:08x}"), style),
            format_success(&name, style)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("e39b7999").ok(), Some(0xe39b_7999));
        assert_eq!(parse_target("0xE39B7999").ok(), Some(0xe39b_7999));
        assert!(parse_target("not-hex").is_err());
        assert!(parse_target("1ffffffff").is_err());
    }
}
