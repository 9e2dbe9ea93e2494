pub mod passes;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use crate::BrainfuckError;
use crate::parser::Program;

/// An optimization pass.
pub trait Pass {

    /// Name of the pass.
    fn name(&self) -> &str;

    /// Executes the pass on the given program, rewriting it in place.
    /// Every pass leaves the loop jumps of the program consistent.
    fn run(&self, program: &mut Program);

}

/// Ordered set of optimization levels, each one selecting a fixed list of passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptimizationLevel {
    None,
    Default,
    Medium,
    /// Same passes as `Medium`.
    Max
}

impl OptimizationLevel {

    /// Names of the passes run at this level, in order.
    pub fn pass_names(self) -> &'static [&'static str] {
        match self {
            OptimizationLevel::None => &[],
            OptimizationLevel::Default => &["dead-code", "remove-noops"],
            OptimizationLevel::Medium |
            OptimizationLevel::Max => &["constant-fold", "dead-code", "remove-noops"]
        }
    }

}

impl Default for OptimizationLevel {
    fn default() -> Self {
        OptimizationLevel::Default
    }
}

impl FromStr for OptimizationLevel {
    type Err = BrainfuckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "0" => Ok(OptimizationLevel::None),
            "default" | "1" => Ok(OptimizationLevel::Default),
            "medium" | "2" => Ok(OptimizationLevel::Medium),
            "max" | "3" => Ok(OptimizationLevel::Max),
            _ => Err(BrainfuckError::UnknownOptimizationLevel(s.to_owned()))
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            OptimizationLevel::None => "none",
            OptimizationLevel::Default => "default",
            OptimizationLevel::Medium => "medium",
            OptimizationLevel::Max => "max"
        };
        write!(f, "{}", s)
    }
}

/// Brainfuck program optimizer.
pub struct Optimizer {
    passes: Vec<Arc<dyn Pass + Sync + Send>>
}

impl Optimizer {

    /// Constructs a new optimizer with the given set of passes.
    pub fn with_passes(passes: Vec<Arc<dyn Pass + Sync + Send>>) -> Optimizer {
        Optimizer {
            passes
        }
    }

    /// Constructs the optimizer running the passes of the given level.
    pub fn for_level(level: OptimizationLevel) -> Optimizer {
        Optimizer {
            passes: level.pass_names().iter().map(|name| Arc::clone(&ALL_OPTIMIZATIONS[name])).collect()
        }
    }

    /// Constructs a new optimizer with the given set of passes.
    /// The passes are specified as a comma-separated string of names
    pub fn with_passes_str(s: &str) -> Result<Optimizer, BrainfuckError> {

        let mut passes = Vec::new();

        match s {
            "none" => {
                // Do nothing, the vector of passes will be empty
            },
            "all" => {
                // All the passes of the strongest level
                return Ok(Optimizer::for_level(OptimizationLevel::Max));
            },
            _ => {
                // Each pass is separated by `,`
                for name in s.split(',') {
                    if let Some(arc) = ALL_OPTIMIZATIONS.get(name.trim()) {
                        passes.push(Arc::clone(arc));
                    } else {
                        return Err(BrainfuckError::UnknownOptimizationPass(name.to_owned()));
                    }
                }
            }
        }

        Ok(Optimizer {
            passes
        })
    }

    /// Returns a slice containing the passes configured for this optimizer.
    pub fn passes(&self) -> &[Arc<dyn Pass + Sync + Send>] {
        &*self.passes
    }

    /// Runs all the passes on the given program, each one exactly once.
    pub fn run(&self, program: &mut Program) {
        for pass in &self.passes {
            let before = program.len();
            pass.run(program);
            debug!("Pass {}: {} -> {} commands.", pass.name(), before, program.len());
        }
    }

}

/// Optimizes the program in place with the passes of the given level.
pub fn optimize(program: &mut Program, level: OptimizationLevel) {
    debug!("Optimizing at level {}.", level);
    Optimizer::for_level(level).run(program);
}

// Builds a static maps of all the passes
lazy_static! {

    /// [`HashMap`](std::collections::HashMap) containing all the registered optimization passes.
    pub static ref ALL_OPTIMIZATIONS: HashMap<&'static str, Arc<dyn Pass + Sync + Send>> = {
        use passes::*;
        let mut map: HashMap<_, Arc<dyn Pass + Sync + Send>> = HashMap::new();
        map.insert("constant-fold", Arc::new(ConstantFold));
        map.insert("dead-code", Arc::new(DeadCode));
        map.insert("remove-noops", Arc::new(RemoveNoops));
        map.insert("collapse-increments", Arc::new(CollapseIncrements));
        map
    };

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn names(o: &Optimizer) -> Vec<&str> {
        o.passes().iter().map(|p| p.name()).collect()
    }

    #[test]
    fn test_level_ladder() {
        assert!(names(&Optimizer::for_level(OptimizationLevel::None)).is_empty());
        assert_eq!(names(&Optimizer::for_level(OptimizationLevel::Default)), vec!["dead-code", "remove-noops"]);
        assert_eq!(names(&Optimizer::for_level(OptimizationLevel::Medium)), vec!["constant-fold", "dead-code", "remove-noops"]);
        assert_eq!(names(&Optimizer::for_level(OptimizationLevel::Max)), names(&Optimizer::for_level(OptimizationLevel::Medium)));
        assert!(OptimizationLevel::None < OptimizationLevel::Default);
        assert!(OptimizationLevel::Medium < OptimizationLevel::Max);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("none".parse::<OptimizationLevel>().unwrap(), OptimizationLevel::None);
        assert_eq!("1".parse::<OptimizationLevel>().unwrap(), OptimizationLevel::Default);
        assert_eq!("Medium".parse::<OptimizationLevel>().unwrap(), OptimizationLevel::Medium);
        assert_eq!("3".parse::<OptimizationLevel>().unwrap(), OptimizationLevel::Max);
        match "4".parse::<OptimizationLevel>() {
            Err(BrainfuckError::UnknownOptimizationLevel(ref s)) if s == "4" => {},
            r => panic!("Expected unknown optimization level. Got: {:?}", r)
        }
    }

    #[test]
    fn test_with_passes_str() {
        assert!(Optimizer::with_passes_str("none").unwrap().passes().is_empty());
        assert_eq!(names(&Optimizer::with_passes_str("all").unwrap()), vec!["constant-fold", "dead-code", "remove-noops"]);
        assert_eq!(names(&Optimizer::with_passes_str("remove-noops,collapse-increments").unwrap()), vec!["remove-noops", "collapse-increments"]);
        match Optimizer::with_passes_str("dead-code,unroll") {
            Err(BrainfuckError::UnknownOptimizationPass(ref s)) if s == "unroll" => {},
            _ => panic!("Expected unknown optimization pass")
        }
    }

    #[test]
    fn test_with_passes() {
        let optimizer = Optimizer::with_passes(vec![
            Arc::new(passes::CollapseIncrements) as Arc<dyn Pass + Sync + Send>,
            Arc::new(passes::RemoveNoops) as Arc<dyn Pass + Sync + Send>
        ]);
        assert_eq!(names(&optimizer), vec!["collapse-increments", "remove-noops"]);

        let mut prog = parse_str("+>-<>+").unwrap();
        optimizer.run(&mut prog);
        assert_eq!(prog, parse_str("+>").unwrap());
    }

    #[test]
    fn test_level_none_is_identity() {
        let source = "[->+<]+++[>++<-]>.,[-]#";
        let mut prog = parse_str(source).unwrap();
        optimize(&mut prog, OptimizationLevel::None);
        assert_eq!(prog, parse_str(source).unwrap());
    }

}
