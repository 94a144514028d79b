//! Process identity from pid files, `/proc`, and the account databases.

use ovn_types::{ClientError, ProcessInfo, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProcFs {
    proc_root: PathBuf,
    etc_root: PathBuf,
}

impl ProcFs {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            etc_root: PathBuf::from("/etc"),
        }
    }

    /// Resolve user and group names against `<etc_root>/passwd` and `<etc_root>/group`.
    pub fn with_etc_root(mut self, etc_root: impl Into<PathBuf>) -> Self {
        self.etc_root = etc_root.into();
        self
    }

    pub async fn read_pid_file(&self, path: &Path) -> Result<u32> {
        let text = tokio::fs::read_to_string(path).await?;
        parse_pid(&text)
    }

    pub async fn is_alive(&self, pid: u32) -> bool {
        tokio::fs::metadata(self.proc_root.join(pid.to_string()))
            .await
            .is_ok()
    }

    pub async fn comm(&self, pid: u32) -> Result<String> {
        let text = self.read(pid, "comm").await?;
        Ok(text.trim().to_string())
    }

    pub async fn parent_pid(&self, pid: u32) -> Result<u32> {
        let text = self.read(pid, "stat").await?;
        parse_stat_ppid(&text)
            .ok_or_else(|| ClientError::Parse(format!("malformed /proc/{}/stat", pid)))
    }

    pub async fn process_info(&self, pid: u32) -> Result<ProcessInfo> {
        let status = self.read(pid, "status").await?;
        let (uid, gid) = parse_status_ids(&status)
            .ok_or_else(|| ClientError::Parse(format!("no Uid/Gid in /proc/{}/status", pid)))?;
        let user = self.resolve("passwd", uid).await;
        let group = self.resolve("group", gid).await;
        Ok(ProcessInfo { pid, user, group })
    }

    async fn read(&self, pid: u32, file: &str) -> Result<String> {
        let path = self.proc_root.join(pid.to_string()).join(file);
        Ok(tokio::fs::read_to_string(path).await?)
    }

    /// Numeric id when the name cannot be resolved.
    async fn resolve(&self, db: &str, id: u32) -> String {
        match tokio::fs::read_to_string(self.etc_root.join(db)).await {
            Ok(text) => lookup_name(&text, id).unwrap_or_else(|| id.to_string()),
            Err(_) => id.to_string(),
        }
    }
}

pub fn parse_pid(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    trimmed
        .parse()
        .map_err(|_| ClientError::Parse(format!("invalid pid: {:?}", trimmed)))
}

/// Real uid and gid from `/proc/<pid>/status`.
pub fn parse_status_ids(text: &str) -> Option<(u32, u32)> {
    let field = |name: &str| {
        text.lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|v| v.parse().ok())
    };
    Some((field("Uid:")?, field("Gid:")?))
}

/// The fourth field of `/proc/<pid>/stat`. `comm` may contain spaces and
/// parentheses, so fields are counted after the last `)`.
pub fn parse_stat_ppid(text: &str) -> Option<u32> {
    let (_, rest) = text.rsplit_once(')')?;
    rest.split_whitespace().nth(1)?.parse().ok()
}

/// Name for `id` in a passwd(5) or group(5) formatted file.
pub fn lookup_name(db: &str, id: u32) -> Option<String> {
    db.lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let mut fields = line.split(':');
            let name = fields.next()?;
            let _password = fields.next()?;
            let entry_id: u32 = fields.next()?.parse().ok()?;
            (entry_id == id).then(|| name.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tovsdb-server\nUmask:\t0022\nState:\tS (sleeping)\nPid:\t812\nPPid:\t811\nUid:\t998\t998\t998\t998\nGid:\t997\t997\t997\t997\n";

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid("812\n").unwrap(), 812);
        assert!(parse_pid("").is_err());
        assert!(parse_pid("abc").is_err());
    }

    #[test]
    fn test_parse_status_ids() {
        assert_eq!(parse_status_ids(STATUS), Some((998, 997)));
        assert_eq!(parse_status_ids("Name:\tx\n"), None);
    }

    #[test]
    fn test_parse_stat_ppid() {
        let stat = "812 (ovsdb-server) S 811 812 812 0 -1 4194560 1234";
        assert_eq!(parse_stat_ppid(stat), Some(811));
        let odd = "900 (a) b) R 1 900 900";
        assert_eq!(parse_stat_ppid(odd), Some(1));
        assert_eq!(parse_stat_ppid("garbage"), None);
    }

    #[test]
    fn test_lookup_name() {
        let passwd = "root:x:0:0:root:/root:/bin/bash\nopenvswitch:x:998:997::/var/lib/openvswitch:/sbin/nologin\n";
        assert_eq!(lookup_name(passwd, 998).as_deref(), Some("openvswitch"));
        assert_eq!(lookup_name(passwd, 0).as_deref(), Some("root"));
        assert_eq!(lookup_name(passwd, 5), None);
        let group = "# comment\nhugetlbfs:x:997:openvswitch\n";
        assert_eq!(lookup_name(group, 997).as_deref(), Some("hugetlbfs"));
    }

    #[tokio::test]
    async fn test_process_info_from_fake_root() {
        let root = std::env::temp_dir().join(format!("ovn-procfs-test-{}", std::process::id()));
        let proc_dir = root.join("proc").join("812");
        let etc_dir = root.join("etc");
        std::fs::create_dir_all(&proc_dir).unwrap();
        std::fs::create_dir_all(&etc_dir).unwrap();
        std::fs::write(proc_dir.join("status"), STATUS).unwrap();
        std::fs::write(proc_dir.join("comm"), "ovsdb-server\n").unwrap();
        std::fs::write(proc_dir.join("stat"), "812 (ovsdb-server) S 811 812").unwrap();
        std::fs::write(etc_dir.join("passwd"), "openvswitch:x:998:997::/:/sbin/nologin\n").unwrap();
        let pid_file = root.join("ovsdb-server.pid");
        std::fs::write(&pid_file, "812\n").unwrap();

        let procfs = ProcFs::new(root.join("proc")).with_etc_root(&etc_dir);
        let pid = procfs.read_pid_file(&pid_file).await.unwrap();
        assert!(procfs.is_alive(pid).await);
        assert!(!procfs.is_alive(813).await);
        assert_eq!(procfs.comm(pid).await.unwrap(), "ovsdb-server");
        assert_eq!(procfs.parent_pid(pid).await.unwrap(), 811);

        let info = procfs.process_info(pid).await.unwrap();
        assert_eq!(info.pid, 812);
        assert_eq!(info.user, "openvswitch");
        // no group file: numeric fallback
        assert_eq!(info.group, "997");

        std::fs::remove_dir_all(&root).ok();
    }
}
