use std::collections::BTreeSet;

/// Domain vocabulary: topic tag and the keywords that imply it.
/// Multi-word keywords match as consecutive tokens.
pub const VOCABULARY: &[(&str, &[&str])] = &[
    (
        "ai-agents",
        &["ai agent", "ai agents", "agent", "agents", "autonomous", "llm", "chatbot", "eliza"],
    ),
    ("bridge", &["bridge", "bridging", "cross chain", "interop", "wormhole"]),
    (
        "defi",
        &["defi", "lending", "borrowing", "yield", "amm", "dex", "swap", "liquidity"],
    ),
    ("depin", &["depin", "physical", "iot", "sensor", "sensors"]),
    ("gaming", &["game", "games", "gaming", "play to earn", "gamefi"]),
    ("identity", &["identity", "did", "credential", "credentials", "reputation"]),
    (
        "infra",
        &[
            "infra",
            "infrastructure",
            "rpc",
            "indexer",
            "sdk",
            "framework",
            "tooling",
            "validator client",
        ],
    ),
    ("memecoins", &["meme", "memes", "memecoin", "memecoins", "pump fun", "fair launch"]),
    ("nft", &["nft", "nfts", "collectible", "collectibles", "metaplex", "digital art"]),
    ("payments", &["payment", "payments", "pay", "remittance", "stablecoin", "stablecoins"]),
    ("privacy", &["privacy", "zero knowledge", "zk", "confidential"]),
    ("rwa", &["rwa", "real world", "tokenized", "tokenization"]),
    ("social", &["social", "community", "messaging", "chat"]),
    (
        "staking",
        &["staking", "stake", "liquid staking", "lst", "validator", "validators", "restaking"],
    ),
    (
        "trading",
        &["trading", "perp", "perps", "perpetual", "futures", "options", "copy trading"],
    ),
];

/// Lower-case and split on anything that isn't alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Topics whose keywords occur as whole tokens in any of `texts`.
pub fn extract_topics<'a>(texts: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    let mut tokens: Vec<String> = Vec::new();
    for text in texts {
        // A sentinel keeps phrases from matching across field boundaries.
        tokens.extend(tokenize(text));
        tokens.push(String::new());
    }

    VOCABULARY
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| contains_phrase(&tokens, kw)))
        .map(|(topic, _)| topic.to_string())
        .collect()
}

/// Display label for a topic tag.
pub fn topic_label(topic: &str) -> String {
    match topic {
        "ai-agents" => "AI Agents".into(),
        "defi" => "DeFi".into(),
        "depin" => "DePIN".into(),
        "nft" => "NFT".into(),
        "rwa" => "Real-World Assets".into(),
        "infra" => "Infrastructure".into(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<String> = tokenize(phrase);
    if words.is_empty() || words.len() > tokens.len() {
        return false;
    }
    tokens.windows(words.len()).any(|window| window == words.as_slice())
}
