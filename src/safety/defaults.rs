/// Returns the default blocklist of (pattern, reason) tuples.
///
/// Commands matching these are never executed, whatever the approval mode.
/// This catches the obvious cluster-wrecking invocations; it is not a
/// substitute for RBAC on the kubeconfig the assistant runs with.
pub fn default_blocklist() -> Vec<(String, String)> {
    vec![
        // Privilege escalation
        (r"(?i)\bsudo\b".into(), "Privilege escalation (sudo) not allowed".into()),
        (r"(?i)\bsu\b\s".into(), "Privilege escalation (su) not allowed".into()),
        (r"(?i)\bdoas\b".into(), "Privilege escalation (doas) not allowed".into()),
        // Destructive filesystem operations at root
        (r"rm\s+(-[^\s]*)?(\s+-[^\s]*)?\s+/($|\s)".into(), "Recursive deletion at root not allowed".into()),
        (r"rm\s+(-[^\s]*)?(\s+-[^\s]*)?\s+/\*".into(), "Recursive deletion at root not allowed".into()),
        // System namespaces
        (
            r"kubectl\s+delete\s+(ns|namespaces?)\s+(kube-system|kube-public|kube-node-lease|default)\b".into(),
            "Deleting a system namespace not allowed".into(),
        ),
        // Cluster-wide mass deletion
        (r"kubectl\s+delete\b.*\s--all-namespaces\b".into(), "Deleting across all namespaces not allowed".into()),
        (r"kubectl\s+delete\b.*\s-A\b".into(), "Deleting across all namespaces not allowed".into()),
        (r"kubectl\s+delete\s+(nodes?|no)\b".into(), "Deleting nodes not allowed".into()),
        (
            r"kubectl\s+delete\s+(crds?|customresourcedefinitions?)\b.*\s--all\b".into(),
            "Deleting all custom resource definitions not allowed".into(),
        ),
        // Credential exposure
        (r"kubectl\s+config\s+view\b.*--raw\b".into(), "Printing raw kubeconfig credentials not allowed".into()),
        (r"helm\s+uninstall\b.*\s(-A|--all-namespaces)\b".into(), "Uninstalling across all namespaces not allowed".into()),
        // Disk-level destructive operations
        (r"(?i)\bmkfs\b".into(), "Filesystem formatting not allowed".into()),
        (r"(?i)\bdd\b\s.*of=/dev/".into(), "Direct device writes not allowed".into()),
        // Host shutdown/reboot
        (r"(?i)\bshutdown\b".into(), "System shutdown not allowed".into()),
        (r"(?i)\breboot\b".into(), "System reboot not allowed".into()),
    ]
}

/// Returns the default auto-approve list used by the `policy` approval mode.
///
/// These are read-only `kubectl`/`helm` invocations. A match only counts if
/// the command has no shell metacharacters and does not touch secrets; see
/// [`super::approval::PolicyGate`].
pub fn default_auto_approve() -> Vec<(String, String)> {
    vec![
        (
            r"^kubectl\s+(get|describe|logs|top|explain|events|version|api-resources|api-versions|cluster-info)\b".into(),
            "Read-only kubectl command".into(),
        ),
        (
            r"^kubectl\s+config\s+(current-context|get-contexts|get-clusters)\b".into(),
            "Read-only kubeconfig query".into(),
        ),
        (
            r"^kubectl\s+auth\s+can-i\b".into(),
            "Permission check".into(),
        ),
        (
            r"^helm\s+(list|ls|status|history|show|search|version|env)\b".into(),
            "Read-only helm command".into(),
        ),
        (
            r"^helm\s+get\s+(manifest|notes|hooks|metadata)\b".into(),
            "Read-only helm release query".into(),
        ),
    ]
}
