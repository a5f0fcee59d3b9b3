pub mod kube;
pub mod shell;

pub use kube::{normalize_command, KubeExecutor, REFUSAL_MESSAGE};
pub use shell::{execute_shell, ExecResult};
