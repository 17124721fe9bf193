/// Tallies PASS/FAIL lines for one suite.
pub struct Report {
    suite: &'static str,
    total: usize,
    passed: usize,
}

impl Report {
    pub fn new(suite: &'static str) -> Self {
        println!("=== {suite} ===");
        Self {
            suite,
            total: 0,
            passed: 0,
        }
    }

    pub fn case(&mut self, name: &str, result: anyhow::Result<()>) {
        self.total += 1;
        match result {
            Ok(()) => {
                println!("  PASS  {name}");
                self.passed += 1;
            }
            Err(e) => println!("  FAIL  {name}: {e:#}"),
        }
    }

    pub fn finish(self) -> anyhow::Result<()> {
        println!();
        println!("{}/{} passed", self.passed, self.total);
        println!();

        if self.passed < self.total {
            anyhow::bail!("{} {} test(s) failed", self.total - self.passed, self.suite);
        }
        Ok(())
    }
}
