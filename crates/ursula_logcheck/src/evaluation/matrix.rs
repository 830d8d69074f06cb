use crate::session::SceneObject;

/// Which condition was ever observed true for which scene object.
///
/// Cells only ever go from false to true. A cell is not recorded while a
/// higher-numbered condition already holds for the same object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatisfactionMatrix {
    conditions: usize,
    objects: usize,
    cells: Vec<bool>,
}

impl SatisfactionMatrix {
    pub fn new(conditions: usize, objects: usize) -> Self {
        Self {
            conditions,
            objects,
            cells: vec![false; conditions * objects],
        }
    }

    pub fn condition_count(&self) -> usize {
        self.conditions
    }

    pub fn get(&self, condition: usize, object: usize) -> bool {
        condition < self.conditions
            && object < self.objects
            && self.cells[condition * self.objects + object]
    }

    /// Records `condition` for `object` unless a later condition already holds
    /// for that object. Returns whether the cell is set afterwards.
    pub fn record(&mut self, condition: usize, object: usize) -> bool {
        if condition >= self.conditions || object >= self.objects {
            return false;
        }
        let superseded = (condition + 1..self.conditions).any(|later| self.get(later, object));
        if !superseded {
            self.cells[condition * self.objects + object] = true;
        }
        self.get(condition, object)
    }

    /// Records `condition` for every object, each under the same precedence rule.
    pub fn record_all(&mut self, condition: usize) {
        for object in 0..self.objects {
            self.record(condition, object);
        }
    }

    pub fn row_satisfied(&self, condition: usize) -> bool {
        (0..self.objects).any(|object| self.get(condition, object))
    }

    pub fn render_human_readable(&self, objects: &[SceneObject]) -> String {
        let mut output = String::from("   ");
        for object in objects.iter().take(self.objects) {
            output.push_str(&format!(" {:>3}", object.label()));
        }
        for condition in 0..self.conditions {
            output.push_str(&format!("\n{condition:>3}"));
            for object in 0..self.objects {
                output.push_str(&format!(" {:>3}", u8::from(self.get(condition, object))));
            }
        }
        output
    }
}
