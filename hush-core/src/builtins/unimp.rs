use crate::{builtins, commands, error};

/// Defines a builtin the shell recognizes but doesn't implement; running it
/// fails with a "not implemented" diagnostic.
macro_rules! unimplemented_builtin {
    ($struct_name:ident, $desc:literal) => {
        #[doc = $desc]
        #[derive(clap::Parser)]
        #[clap(disable_help_flag = true)]
        pub(crate) struct $struct_name {
            #[clap(allow_hyphen_values = true)]
            _args: Vec<String>,
        }

        impl builtins::Command for $struct_name {
            fn execute(
                &self,
                _context: commands::ExecutionContext<'_>,
            ) -> Result<builtins::ExitCode, error::Error> {
                error::unimp(stringify!($struct_name))
            }
        }
    };
}

unimplemented_builtin!(BreakCommand, "Exit for, while or until loop");
unimplemented_builtin!(ContinueCommand, "Continue for, while or until loop");
unimplemented_builtin!(ReturnCommand, "Return from a function");
unimplemented_builtin!(TrapCommand, "Trap signals");
unimplemented_builtin!(ULimitCommand, "Controls resource limits");
