//! Implements the shell's variable environment.

use indexmap::IndexMap;

use crate::error;
use crate::variables::ShellVariable;

/// Name of the pseudo-variable that always heads the environment.
pub const VERSION_VAR_NAME: &str = "HUSH_VERSION";

/// Value of [`VERSION_VAR_NAME`].
pub const VERSION_VAR_VALUE: &str = "0.01";

/// Represents the shell variable environment: an insertion-ordered table of
/// unique names, overlaying the environment the shell was started with.
#[derive(Clone, Debug)]
pub struct ShellEnvironment {
    variables: IndexMap<String, ShellVariable>,
}

impl Default for ShellEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellEnvironment {
    /// Returns a new shell environment, holding only the readonly, exported
    /// version variable.
    pub fn new() -> Self {
        let mut version = ShellVariable::new(VERSION_VAR_VALUE);
        version.export().set_readonly();

        let mut variables = IndexMap::new();
        variables.insert(VERSION_VAR_NAME.to_owned(), version);

        Self { variables }
    }

    /// Imports the given variables as exported bindings. Names that are
    /// already bound (such as the version variable) are left alone.
    ///
    /// # Arguments
    ///
    /// * `vars` - The name/value pairs to import, typically from the process
    ///   environment.
    pub fn import<N: Into<String>, V: Into<String>>(
        &mut self,
        vars: impl IntoIterator<Item = (N, V)>,
    ) {
        for (name, value) in vars {
            let name = name.into();
            if !self.variables.contains_key(&name) {
                let mut var = ShellVariable::new(value);
                var.export();
                self.variables.insert(name, var);
            }
        }
    }

    //
    // Iterators/Getters
    //

    /// Returns an iterator over all the variables in the environment, in the
    /// order they were first defined.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ShellVariable)> {
        self.variables.iter()
    }

    /// Returns an iterator over all exported variables in the environment.
    pub fn iter_exported(&self) -> impl Iterator<Item = (&String, &ShellVariable)> {
        self.variables.iter().filter(|(_, var)| var.is_exported())
    }

    /// Tries to retrieve the variable with the given name.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the variable to retrieve.
    pub fn get(&self, name: &str) -> Option<&ShellVariable> {
        self.variables.get(name)
    }

    /// Tries to retrieve the value of the variable with the given name.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the variable to retrieve.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).map(ShellVariable::value)
    }

    //
    // Setters
    //

    /// Assigns a value to a variable, creating it if needed. An existing
    /// variable keeps its export flag; `export` can only add the flag.
    /// Assigning a variable its current value changes nothing beyond that.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the variable to set.
    /// * `value` - The value to assign.
    /// * `export` - Whether the variable should be exported.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<String>,
        export: bool,
    ) -> Result<(), error::Error> {
        let value = value.into();

        if let Some(var) = self.variables.get_mut(name) {
            if var.value() != value {
                if var.is_readonly() {
                    return Err(error::Error::ReadonlyVariable(name.to_owned()));
                }
                var.assign(value);
            }
            if export {
                var.export();
            }
        } else {
            let mut var = ShellVariable::new(value);
            if export {
                var.export();
            }
            self.variables.insert(name.to_owned(), var);
        }

        Ok(())
    }

    /// Marks an existing variable as exported. Returns whether the variable
    /// exists.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the variable to export.
    pub fn export(&mut self, name: &str) -> bool {
        self.variables.get_mut(name).map(ShellVariable::export).is_some()
    }

    /// Removes the variable with the given name, returning whether it existed.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the variable to unset.
    pub fn unset(&mut self, name: &str) -> Result<bool, error::Error> {
        match self.variables.get(name) {
            Some(var) if var.is_readonly() => Err(error::Error::ReadonlyVariable(name.to_owned())),
            Some(_) => Ok(self.variables.shift_remove(name).is_some()),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn version_variable_is_first_and_protected() -> Result<()> {
        let mut env = ShellEnvironment::new();
        env.import([("HOME", "/home/me"), (VERSION_VAR_NAME, "9.9")]);

        let names: Vec<_> = env.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec![VERSION_VAR_NAME, "HOME"]);
        assert_eq!(env.get_str(VERSION_VAR_NAME), Some(VERSION_VAR_VALUE));

        assert!(env.set(VERSION_VAR_NAME, "1.0", false).is_err());
        assert!(env.unset(VERSION_VAR_NAME).is_err());
        assert_eq!(env.get_str(VERSION_VAR_NAME), Some(VERSION_VAR_VALUE));
        Ok(())
    }

    #[test]
    fn set_preserves_export() -> Result<()> {
        let mut env = ShellEnvironment::new();
        env.import([("PATH", "/bin")]);

        env.set("PATH", "/usr/bin", false)?;
        let var = env
            .get("PATH")
            .ok_or_else(|| anyhow::anyhow!("PATH missing"))?;
        assert!(var.is_exported());
        assert_eq!(var.value(), "/usr/bin");

        env.set("LOCAL", "x", false)?;
        assert_eq!(env.iter_exported().count(), 2);
        assert!(env.export("LOCAL"));
        assert_eq!(env.iter_exported().count(), 3);
        assert!(!env.export("MISSING"));
        Ok(())
    }

    #[test]
    fn same_value_on_readonly_is_a_no_op() -> Result<()> {
        let mut env = ShellEnvironment::new();
        env.set(VERSION_VAR_NAME, VERSION_VAR_VALUE, false)?;

        let var = env
            .get(VERSION_VAR_NAME)
            .ok_or_else(|| anyhow::anyhow!("version variable missing"))?;
        assert_eq!(var.value(), VERSION_VAR_VALUE);
        assert!(var.is_readonly());
        assert!(var.is_exported());

        assert!(matches!(
            env.set(VERSION_VAR_NAME, "0.02", false),
            Err(error::Error::ReadonlyVariable(_))
        ));
        Ok(())
    }

    #[test]
    fn reassigning_never_unexports() -> Result<()> {
        let mut env = ShellEnvironment::new();
        env.set("EDITOR", "vi", true)?;

        env.set("EDITOR", "vi", false)?;
        let var = env
            .get("EDITOR")
            .ok_or_else(|| anyhow::anyhow!("EDITOR missing"))?;
        assert!(var.is_exported());
        assert_eq!(var.value(), "vi");

        env.set("EDITOR", "ed", false)?;
        let var = env
            .get("EDITOR")
            .ok_or_else(|| anyhow::anyhow!("EDITOR missing"))?;
        assert!(var.is_exported());
        assert_eq!(var.value(), "ed");
        Ok(())
    }

    #[test]
    fn unset_keeps_order() -> Result<()> {
        let mut env = ShellEnvironment::new();
        env.set("A", "1", false)?;
        env.set("B", "2", false)?;
        env.set("C", "3", false)?;

        assert!(env.unset("B")?);
        assert!(!env.unset("B")?);

        let names: Vec<_> = env.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec![VERSION_VAR_NAME, "A", "C"]);
        Ok(())
    }
}
