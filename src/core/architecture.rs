//! Host architecture detection.

use crate::util::exec::CommandRunner;
use anyhow::Result;

pub const ARCH_X86_64: &str = "x86_64";
pub const ARCH_AARCH64: &str = "aarch64";
pub const ARCH_PPC64LE: &str = "ppc64le";
pub const ARCH_S390X: &str = "s390x";

/// Detect the hardware architecture reported to the registration flow.
///
/// `uname -i` is preferred; when it reports `unknown` (common on non-x86
/// platforms) the machine architecture from `uname -m` is used instead.
pub fn detect_architecture(runner: &dyn CommandRunner) -> Result<String> {
    let hardware = uname(runner, "-i")?;
    if hardware != "unknown" {
        return Ok(hardware);
    }
    uname(runner, "-m")
}

fn uname(runner: &dyn CommandRunner, flag: &str) -> Result<String> {
    let out = runner.output("uname", &[flag], &[])?;
    Ok(String::from_utf8_lossy(&out).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeUname {
        hardware: &'static str,
        machine: &'static str,
    }

    impl CommandRunner for FakeUname {
        fn output(&self, program: &str, args: &[&str], _allowed: &[i32]) -> Result<Vec<u8>> {
            assert_eq!(program, "uname");
            let reply = match args {
                ["-i"] => self.hardware,
                ["-m"] => self.machine,
                other => panic!("unexpected uname args {:?}", other),
            };
            Ok(format!("{}\n", reply).into_bytes())
        }
    }

    #[test]
    fn test_uses_hardware_platform() {
        let runner = FakeUname {
            hardware: ARCH_X86_64,
            machine: "never asked",
        };
        assert_eq!(detect_architecture(&runner).unwrap(), ARCH_X86_64);
    }

    #[test]
    fn test_falls_back_to_machine_architecture() {
        let runner = FakeUname {
            hardware: "unknown",
            machine: ARCH_AARCH64,
        };
        assert_eq!(detect_architecture(&runner).unwrap(), ARCH_AARCH64);
    }
}
