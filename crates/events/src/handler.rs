use catledger_core::Aggregate;

/// Decide, then apply every decided change in order.
///
/// Returns the applied changes. If `decide` fails nothing is applied.
pub fn execute<A: Aggregate>(aggregate: &mut A, input: &A::Input) -> Result<Vec<A::Change>, A::Error> {
    let changes = aggregate.decide(input)?;
    for change in &changes {
        aggregate.apply(change);
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catledger_core::AggregateRoot;

    /// Counter that accepts increments up to a ceiling.
    #[derive(Debug, Default)]
    struct Bounded {
        id: String,
        total: u32,
        version: u64,
    }

    impl AggregateRoot for Bounded {
        type Id = String;

        fn id(&self) -> &String {
            &self.id
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    impl Aggregate for Bounded {
        type Input = Vec<u32>;
        type Change = u32;
        type Error = String;

        fn decide(&self, input: &Vec<u32>) -> Result<Vec<u32>, String> {
            let sum: u32 = input.iter().sum();
            if self.total + sum > 10 {
                return Err(format!("would reach {}", self.total + sum));
            }
            Ok(input.clone())
        }

        fn apply(&mut self, change: &u32) {
            self.total += change;
            self.version += 1;
        }
    }

    #[test]
    fn decided_changes_are_applied_in_order() {
        let mut agg = Bounded::default();
        assert_eq!(execute(&mut agg, &vec![2, 3]).unwrap(), vec![2, 3]);
        assert_eq!(agg.total, 5);
        assert_eq!(agg.version(), 2);
    }

    #[test]
    fn rejected_input_leaves_state_untouched() {
        let mut agg = Bounded::default();
        execute(&mut agg, &vec![4]).unwrap();
        assert_eq!(execute(&mut agg, &vec![4, 4]).unwrap_err(), "would reach 12");
        assert_eq!(agg.total, 4);
        assert_eq!(agg.version(), 1);
    }
}
