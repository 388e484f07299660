/// 首幀／尾幀標記與事故旗標
///
/// 不變條件：清除首幀時，尾幀必須在同一次轉換中一併清除。
/// 尾幀只能在首幀存在時設定。首尾之間不做大小排序，匯出時視為兩個獨立取樣點。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkState {
    first_frame: Option<u64>,
    last_frame: Option<u64>,
    accident: bool,
}

impl MarkState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            first_frame: None,
            last_frame: None,
            accident: false,
        }
    }

    #[must_use]
    pub const fn first_frame(&self) -> Option<u64> {
        self.first_frame
    }

    #[must_use]
    pub const fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    #[must_use]
    pub const fn accident(&self) -> bool {
        self.accident
    }

    /// 同一幀再按一次即取消首幀，並連帶清除尾幀；否則改標為首幀（尾幀不變）
    pub fn toggle_first(&mut self, index: u64) {
        if self.first_frame == Some(index) {
            self.first_frame = None;
            self.last_frame = None;
        } else {
            self.first_frame = Some(index);
        }
    }

    /// 同一幀再按一次即取消尾幀；否則改標為尾幀
    ///
    /// 首幀尚未標記時不做任何事並回傳 `false`，讓「有尾幀必有首幀」
    /// 在任何操作序列後都成立。
    pub fn toggle_last(&mut self, index: u64) -> bool {
        if self.first_frame.is_none() {
            return false;
        }
        if self.last_frame == Some(index) {
            self.last_frame = None;
        } else {
            self.last_frame = Some(index);
        }
        true
    }

    pub fn toggle_accident(&mut self) {
        self.accident = !self.accident;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// 首尾都已標記時回傳 `(first, last)`
    #[must_use]
    pub const fn marks(&self) -> Option<(u64, u64)> {
        match (self.first_frame, self.last_frame) {
            (Some(first), Some(last)) => Some((first, last)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_first_twice_restores_empty() {
        let mut marks = MarkState::new();
        marks.toggle_first(5);
        assert_eq!(marks.first_frame(), Some(5));
        marks.toggle_first(5);
        assert_eq!(marks, MarkState::new());
    }

    #[test]
    fn test_toggle_first_off_clears_last_and_does_not_restore_it() {
        let mut marks = MarkState::new();
        marks.toggle_first(10);
        marks.toggle_last(40);

        marks.toggle_first(10);
        assert_eq!(marks.first_frame(), None);
        assert_eq!(marks.last_frame(), None);

        marks.toggle_first(10);
        assert_eq!(marks.first_frame(), Some(10));
        assert_eq!(marks.last_frame(), None);
    }

    #[test]
    fn test_toggle_first_on_other_frame_keeps_last() {
        let mut marks = MarkState::new();
        marks.toggle_first(10);
        marks.toggle_last(40);
        marks.toggle_first(20);
        assert_eq!(marks.marks(), Some((20, 40)));
    }

    #[test]
    fn test_toggle_last() {
        let mut marks = MarkState::new();
        marks.toggle_first(1);
        marks.toggle_last(7);
        assert_eq!(marks.last_frame(), Some(7));
        marks.toggle_last(8);
        assert_eq!(marks.last_frame(), Some(8));
        marks.toggle_last(8);
        assert_eq!(marks.last_frame(), None);
        assert_eq!(marks.first_frame(), Some(1));
    }

    #[test]
    fn test_toggle_last_without_first_is_rejected() {
        let mut marks = MarkState::new();
        assert!(!marks.toggle_last(3));
        assert_eq!(marks, MarkState::new());
    }

    #[test]
    fn test_last_implies_first_after_any_sequence() {
        // 以固定序列模擬任意操作組合
        let ops: [(bool, u64); 12] = [
            (true, 3),
            (false, 9),
            (true, 4),
            (false, 9),
            (false, 2),
            (true, 4),
            (true, 1),
            (false, 1),
            (true, 1),
            (false, 5),
            (true, 6),
            (true, 6),
        ];
        let mut marks = MarkState::new();
        for (is_first, index) in ops {
            if is_first {
                marks.toggle_first(index);
            } else {
                marks.toggle_last(index);
            }
            if marks.last_frame().is_some() {
                assert!(marks.first_frame().is_some());
            }
        }
    }

    #[test]
    fn test_accident_and_reset() {
        let mut marks = MarkState::new();
        marks.toggle_accident();
        assert!(marks.accident());
        marks.toggle_first(2);
        marks.toggle_last(3);
        marks.reset();
        assert_eq!(marks, MarkState::default());
    }
}
