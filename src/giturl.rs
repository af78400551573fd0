use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

fn validate_component(s: &str, label: &str) -> Result<()> {
    if s.is_empty() {
        bail!("{} cannot be empty", label);
    }
    if s.contains("..") {
        bail!("{} contains unsafe path component \"..\": {:?}", label, s);
    }
    if s.starts_with('/') || s.ends_with('/') {
        bail!("{} contains leading/trailing slash: {:?}", label, s);
    }
    if s.contains('\0') {
        bail!("{} contains null byte: {:?}", label, s);
    }
    Ok(())
}

impl Parsed {
    /// `host/owner/repo`, the same for the SSH and HTTPS form of a URL.
    pub fn identity(&self) -> String {
        format!("{}/{}/{}", self.host, self.owner, self.repo)
    }

    fn validate(&self) -> Result<()> {
        validate_component(&self.host, "host")?;
        validate_component(&self.owner, "owner")?;
        validate_component(&self.repo, "repo")?;
        Ok(())
    }
}

pub fn parse(raw_url: &str) -> Result<Parsed> {
    let parsed = if raw_url.starts_with("git@") {
        parse_ssh(raw_url)?
    } else {
        parse_https(raw_url)?
    };
    parsed.validate()?;
    Ok(parsed)
}

fn split_path(path: &str, raw: &str) -> Result<(String, String)> {
    let path = path.strip_suffix(".git").unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 {
        bail!("invalid URL path: {}", raw);
    }
    Ok((
        segments[..segments.len() - 1].join("/"),
        segments[segments.len() - 1].to_string(),
    ))
}

fn parse_ssh(raw: &str) -> Result<Parsed> {
    let without_prefix = raw.strip_prefix("git@").unwrap_or(raw);
    let Some((host, path)) = without_prefix.split_once(':') else {
        bail!("invalid SSH URL: {}", raw);
    };
    let (owner, repo) = split_path(path, raw)?;
    Ok(Parsed {
        host: host.to_string(),
        owner,
        repo,
    })
}

fn parse_https(raw: &str) -> Result<Parsed> {
    let u: url::Url = raw
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid URL: {}", e))?;
    let (owner, repo) = split_path(u.path().trim_start_matches('/'), raw)?;
    Ok(Parsed {
        host: u.host_str().unwrap_or("").to_string(),
        owner,
        repo,
    })
}

/// Reports whether two remote URLs name the same repository. URLs that do
/// not parse are compared verbatim.
pub fn same_repo(a: &str, b: &str) -> bool {
    match (parse(a), parse(b)) {
        (Ok(pa), Ok(pb)) => pa.identity().eq_ignore_ascii_case(&pb.identity()),
        _ => a.trim_end_matches('/') == b.trim_end_matches('/'),
    }
}
