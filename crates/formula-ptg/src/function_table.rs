//! Built-in function metadata (BIFF `iftab` table).
//!
//! `PtgFunc` / `PtgFuncVar` tokens identify built-in functions with a 16-bit index (`iftab`).
//! The codec needs this table for exactly one thing: resolving how many operands a
//! fixed-arity `PtgFunc` consumes, since that token stores no argument count on disk.
//!
//! The dataset covers every named id in `0..=484`: the BIFF8 worksheet functions, the XLM
//! macro functions that show up in defined names (`DEREF`, `TEXTREF`, ...), and the Excel
//! 2007 block (`BAHTTEXT` at 368 through `AVERAGEIFS` at 484). Ids reserved by the format
//! (202, 203, 217, 218, 249, 250, 333) and the user-defined marker [`FTAB_USER_DEFINED`] have
//! no entry. Functions added after Excel 2007 are stored as user-defined calls; lookups for
//! anything outside the table return `None`, which callers must handle.
//!
//! The table is a `static` literal and has no mutation API.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::class::PtgClass;

/// BIFF `iftab` value used for user-defined / add-in / future functions.
pub const FTAB_USER_DEFINED: u16 = 255;

/// `max_args` sentinel for functions accepting any number of arguments (up to the format limit).
pub const MAX_ARGS_UNBOUNDED: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub id: u16,
    pub name: &'static str,
    pub min_args: u8,
    pub max_args: u8,
    /// Natural class of the function's result, used when building a new `PtgFunc`/`PtgFuncVar`.
    pub return_class: PtgClass,
    /// Recalculated on every evaluation (`RAND`, `NOW`, `OFFSET`, ...).
    pub volatile: bool,
}

impl FunctionSpec {
    pub const fn is_fixed_arity(&self) -> bool {
        self.min_args == self.max_args
    }

    pub const fn is_unbounded(&self) -> bool {
        self.max_args == MAX_ARGS_UNBOUNDED
    }

    /// Whether a call with `arg_count` arguments is within this function's bounds.
    pub const fn accepts(&self, arg_count: u8) -> bool {
        arg_count >= self.min_args && (self.is_unbounded() || arg_count <= self.max_args)
    }
}

const R: PtgClass = PtgClass::Reference;
const V: PtgClass = PtgClass::Value;
const A: PtgClass = PtgClass::Array;
const N: u8 = MAX_ARGS_UNBOUNDED;

const fn f(id: u16, name: &'static str, min_args: u8, max_args: u8, ret: PtgClass) -> FunctionSpec {
    FunctionSpec {
        id,
        name,
        min_args,
        max_args,
        return_class: ret,
        volatile: false,
    }
}

const fn volatile(spec: FunctionSpec) -> FunctionSpec {
    FunctionSpec {
        volatile: true,
        ..spec
    }
}

// Sorted by id; `function_spec_from_id` binary-searches this slice.
static FUNCTION_SPECS: &[FunctionSpec] = &[
    f(0, "COUNT", 0, N, V),
    f(1, "IF", 2, 3, R),
    f(2, "ISNA", 1, 1, V),
    f(3, "ISERROR", 1, 1, V),
    f(4, "SUM", 0, N, V),
    f(5, "AVERAGE", 1, N, V),
    f(6, "MIN", 1, N, V),
    f(7, "MAX", 1, N, V),
    f(8, "ROW", 0, 1, V),
    f(9, "COLUMN", 0, 1, V),
    f(10, "NA", 0, 0, V),
    f(11, "NPV", 2, N, V),
    f(12, "STDEV", 1, N, V),
    f(13, "DOLLAR", 1, 2, V),
    f(14, "FIXED", 1, 3, V),
    f(15, "SIN", 1, 1, V),
    f(16, "COS", 1, 1, V),
    f(17, "TAN", 1, 1, V),
    f(18, "ATAN", 1, 1, V),
    f(19, "PI", 0, 0, V),
    f(20, "SQRT", 1, 1, V),
    f(21, "EXP", 1, 1, V),
    f(22, "LN", 1, 1, V),
    f(23, "LOG10", 1, 1, V),
    f(24, "ABS", 1, 1, V),
    f(25, "INT", 1, 1, V),
    f(26, "SIGN", 1, 1, V),
    f(27, "ROUND", 2, 2, V),
    f(28, "LOOKUP", 2, 3, V),
    f(29, "INDEX", 2, 4, R),
    f(30, "REPT", 2, 2, V),
    f(31, "MID", 3, 3, V),
    f(32, "LEN", 1, 1, V),
    f(33, "VALUE", 1, 1, V),
    f(34, "TRUE", 0, 0, V),
    f(35, "FALSE", 0, 0, V),
    f(36, "AND", 1, N, V),
    f(37, "OR", 1, N, V),
    f(38, "NOT", 1, 1, V),
    f(39, "MOD", 2, 2, V),
    f(40, "DCOUNT", 3, 3, V),
    f(41, "DSUM", 3, 3, V),
    f(42, "DAVERAGE", 3, 3, V),
    f(43, "DMIN", 3, 3, V),
    f(44, "DMAX", 3, 3, V),
    f(45, "DSTDEV", 3, 3, V),
    f(46, "VAR", 1, N, V),
    f(47, "DVAR", 3, 3, V),
    f(48, "TEXT", 2, 2, V),
    f(49, "LINEST", 1, 4, A),
    f(50, "TREND", 1, 4, A),
    f(51, "LOGEST", 1, 4, A),
    f(52, "GROWTH", 1, 4, A),
    f(53, "GOTO", 1, 1, V),
    f(54, "HALT", 0, 1, V),
    f(55, "RETURN", 0, 1, V),
    f(56, "PV", 3, 5, V),
    f(57, "FV", 3, 5, V),
    f(58, "NPER", 3, 5, V),
    f(59, "PMT", 3, 5, V),
    f(60, "RATE", 3, 6, V),
    f(61, "MIRR", 3, 3, V),
    f(62, "IRR", 1, 2, V),
    volatile(f(63, "RAND", 0, 0, V)),
    f(64, "MATCH", 2, 3, V),
    f(65, "DATE", 3, 3, V),
    f(66, "TIME", 3, 3, V),
    f(67, "DAY", 1, 1, V),
    f(68, "MONTH", 1, 1, V),
    f(69, "YEAR", 1, 1, V),
    f(70, "WEEKDAY", 1, 2, V),
    f(71, "HOUR", 1, 1, V),
    f(72, "MINUTE", 1, 1, V),
    f(73, "SECOND", 1, 1, V),
    volatile(f(74, "NOW", 0, 0, V)),
    f(75, "AREAS", 1, 1, V),
    f(76, "ROWS", 1, 1, V),
    f(77, "COLUMNS", 1, 1, V),
    volatile(f(78, "OFFSET", 3, 5, R)),
    f(79, "ABSREF", 2, 2, R),
    f(80, "RELREF", 2, 2, V),
    f(81, "ARGUMENT", 0, 3, V),
    f(82, "SEARCH", 2, 3, V),
    f(83, "TRANSPOSE", 1, 1, A),
    f(84, "ERROR", 1, 2, V),
    f(85, "STEP", 0, 0, V),
    f(86, "TYPE", 1, 1, V),
    f(87, "ECHO", 0, 1, V),
    f(88, "SET.NAME", 1, 2, V),
    f(89, "CALLER", 0, 0, R),
    f(90, "DEREF", 1, 1, V),
    f(91, "WINDOWS", 0, 2, V),
    f(92, "SERIES", 4, 5, V),
    f(93, "DOCUMENTS", 0, 2, V),
    f(94, "ACTIVE.CELL", 0, 0, R),
    f(95, "SELECTION", 0, 0, R),
    f(96, "RESULT", 0, 1, V),
    f(97, "ATAN2", 2, 2, V),
    f(98, "ASIN", 1, 1, V),
    f(99, "ACOS", 1, 1, V),
    f(100, "CHOOSE", 2, N, R),
    f(101, "HLOOKUP", 3, 4, V),
    f(102, "VLOOKUP", 3, 4, V),
    f(103, "LINKS", 0, 2, V),
    f(104, "INPUT", 1, 7, V),
    f(105, "ISREF", 1, 1, V),
    f(106, "GET.FORMULA", 1, 1, V),
    f(107, "GET.NAME", 1, 2, V),
    f(108, "SET.VALUE", 2, 2, V),
    f(109, "LOG", 1, 2, V),
    f(110, "EXEC", 1, 4, V),
    f(111, "CHAR", 1, 1, V),
    f(112, "LOWER", 1, 1, V),
    f(113, "UPPER", 1, 1, V),
    f(114, "PROPER", 1, 1, V),
    f(115, "LEFT", 1, 2, V),
    f(116, "RIGHT", 1, 2, V),
    f(117, "EXACT", 2, 2, V),
    f(118, "TRIM", 1, 1, V),
    f(119, "REPLACE", 4, 4, V),
    f(120, "SUBSTITUTE", 3, 4, V),
    f(121, "CODE", 1, 1, V),
    f(122, "NAMES", 0, 3, V),
    f(123, "DIRECTORY", 0, 1, V),
    f(124, "FIND", 2, 3, V),
    volatile(f(125, "CELL", 1, 2, V)),
    f(126, "ISERR", 1, 1, V),
    f(127, "ISTEXT", 1, 1, V),
    f(128, "ISNUMBER", 1, 1, V),
    f(129, "ISBLANK", 1, 1, V),
    f(130, "T", 1, 1, V),
    f(131, "N", 1, 1, V),
    f(132, "FOPEN", 1, 2, V),
    f(133, "FCLOSE", 1, 1, V),
    f(134, "FSIZE", 1, 1, V),
    f(135, "FREADLN", 1, 1, V),
    f(136, "FREAD", 2, 2, V),
    f(137, "FWRITELN", 2, 2, V),
    f(138, "FWRITE", 2, 2, V),
    f(139, "FPOS", 1, 2, V),
    f(140, "DATEVALUE", 1, 1, V),
    f(141, "TIMEVALUE", 1, 1, V),
    f(142, "SLN", 3, 3, V),
    f(143, "SYD", 4, 4, V),
    f(144, "DDB", 4, 5, V),
    f(145, "GET.DEF", 1, 3, V),
    f(146, "REFTEXT", 1, 2, V),
    f(147, "TEXTREF", 1, 2, R),
    volatile(f(148, "INDIRECT", 1, 2, R)),
    f(149, "REGISTER", 1, N, V),
    f(150, "CALL", 1, N, V),
    f(151, "ADD.BAR", 0, 1, V),
    f(152, "ADD.MENU", 2, 4, V),
    f(153, "ADD.COMMAND", 3, 5, V),
    f(154, "ENABLE.COMMAND", 4, 5, V),
    f(155, "CHECK.COMMAND", 4, 5, V),
    f(156, "RENAME.COMMAND", 4, 5, V),
    f(157, "SHOW.BAR", 0, 1, V),
    f(158, "DELETE.MENU", 2, 3, V),
    f(159, "DELETE.COMMAND", 3, 4, V),
    f(160, "GET.CHART.ITEM", 1, 3, V),
    f(161, "DIALOG.BOX", 1, 1, V),
    f(162, "CLEAN", 1, 1, V),
    f(163, "MDETERM", 1, 1, V),
    f(164, "MINVERSE", 1, 1, A),
    f(165, "MMULT", 2, 2, A),
    f(166, "FILES", 0, 2, V),
    f(167, "IPMT", 4, 6, V),
    f(168, "PPMT", 4, 6, V),
    f(169, "COUNTA", 0, N, V),
    f(170, "CANCEL.KEY", 0, 2, V),
    f(171, "FOR", 3, 4, V),
    f(172, "WHILE", 1, 1, V),
    f(173, "BREAK", 0, 0, V),
    f(174, "NEXT", 0, 0, V),
    f(175, "INITIATE", 2, 2, V),
    f(176, "REQUEST", 2, 2, V),
    f(177, "POKE", 3, 3, V),
    f(178, "EXECUTE", 2, 2, V),
    f(179, "TERMINATE", 1, 1, V),
    f(180, "RESTART", 0, 1, V),
    f(181, "HELP", 0, 1, V),
    f(182, "GET.BAR", 0, 4, V),
    f(183, "PRODUCT", 0, N, V),
    f(184, "FACT", 1, 1, V),
    f(185, "GET.CELL", 1, 2, V),
    f(186, "GET.WORKSPACE", 1, 1, V),
    f(187, "GET.WINDOW", 1, 2, V),
    f(188, "GET.DOCUMENT", 1, 2, V),
    f(189, "DPRODUCT", 3, 3, V),
    f(190, "ISNONTEXT", 1, 1, V),
    f(191, "GET.NOTE", 0, 3, V),
    f(192, "NOTE", 0, 4, V),
    f(193, "STDEVP", 1, N, V),
    f(194, "VARP", 1, N, V),
    f(195, "DSTDEVP", 3, 3, V),
    f(196, "DVARP", 3, 3, V),
    f(197, "TRUNC", 1, 2, V),
    f(198, "ISLOGICAL", 1, 1, V),
    f(199, "DCOUNTA", 3, 3, V),
    f(200, "DELETE.BAR", 1, 1, V),
    f(201, "UNREGISTER", 1, 1, V),
    f(204, "USDOLLAR", 1, 2, V),
    f(205, "FINDB", 2, 3, V),
    f(206, "SEARCHB", 2, 3, V),
    f(207, "REPLACEB", 4, 4, V),
    f(208, "LEFTB", 1, 2, V),
    f(209, "RIGHTB", 1, 2, V),
    f(210, "MIDB", 3, 3, V),
    f(211, "LENB", 1, 1, V),
    f(212, "ROUNDUP", 2, 2, V),
    f(213, "ROUNDDOWN", 2, 2, V),
    f(214, "ASC", 1, 1, V),
    f(215, "DBCS", 1, 1, V),
    f(216, "RANK", 2, 3, V),
    f(219, "ADDRESS", 2, 5, V),
    f(220, "DAYS360", 2, 3, V),
    volatile(f(221, "TODAY", 0, 0, V)),
    f(222, "VDB", 5, 7, V),
    f(223, "ELSE", 0, 0, V),
    f(224, "ELSE.IF", 1, 1, V),
    f(225, "END.IF", 0, 0, V),
    f(226, "FOR.CELL", 1, 3, V),
    f(227, "MEDIAN", 1, N, V),
    f(228, "SUMPRODUCT", 1, N, V),
    f(229, "SINH", 1, 1, V),
    f(230, "COSH", 1, 1, V),
    f(231, "TANH", 1, 1, V),
    f(232, "ASINH", 1, 1, V),
    f(233, "ACOSH", 1, 1, V),
    f(234, "ATANH", 1, 1, V),
    f(235, "DGET", 3, 3, V),
    f(236, "CREATE.OBJECT", 2, 11, V),
    f(237, "VOLATILE", 0, 1, V),
    f(238, "LAST.ERROR", 0, 0, V),
    f(239, "CUSTOM.UNDO", 0, 2, V),
    f(240, "CUSTOM.REPEAT", 0, 3, V),
    f(241, "FORMULA.CONVERT", 2, 5, V),
    f(242, "GET.LINK.INFO", 2, 4, V),
    f(243, "TEXT.BOX", 1, 4, V),
    volatile(f(244, "INFO", 1, 1, V)),
    f(245, "GROUP", 0, 0, V),
    f(246, "GET.OBJECT", 1, 5, V),
    f(247, "DB", 4, 5, V),
    f(248, "PAUSE", 0, 1, V),
    f(251, "RESUME", 0, 1, V),
    f(252, "FREQUENCY", 2, 2, A),
    f(253, "ADD.TOOLBAR", 0, 2, V),
    f(254, "DELETE.TOOLBAR", 1, 1, V),
    f(256, "RESET.TOOLBAR", 1, 1, V),
    f(257, "EVALUATE", 1, 1, V),
    f(258, "GET.TOOLBAR", 1, 2, V),
    f(259, "GET.TOOL", 1, 3, V),
    f(260, "SPELLING.CHECK", 1, 3, V),
    f(261, "ERROR.TYPE", 1, 1, V),
    f(262, "APP.TITLE", 0, 1, V),
    f(263, "WINDOW.TITLE", 0, 1, V),
    f(264, "SAVE.TOOLBAR", 0, 2, V),
    f(265, "ENABLE.TOOL", 3, 3, V),
    f(266, "PRESS.TOOL", 3, 3, V),
    f(267, "REGISTER.ID", 2, 3, V),
    f(268, "GET.WORKBOOK", 1, 2, V),
    f(269, "AVEDEV", 1, N, V),
    f(270, "BETADIST", 3, 5, V),
    f(271, "GAMMALN", 1, 1, V),
    f(272, "BETAINV", 3, 5, V),
    f(273, "BINOMDIST", 4, 4, V),
    f(274, "CHIDIST", 2, 2, V),
    f(275, "CHIINV", 2, 2, V),
    f(276, "COMBIN", 2, 2, V),
    f(277, "CONFIDENCE", 3, 3, V),
    f(278, "CRITBINOM", 3, 3, V),
    f(279, "EVEN", 1, 1, V),
    f(280, "EXPONDIST", 3, 3, V),
    f(281, "FDIST", 3, 3, V),
    f(282, "FINV", 3, 3, V),
    f(283, "FISHER", 1, 1, V),
    f(284, "FISHERINV", 1, 1, V),
    f(285, "FLOOR", 2, 2, V),
    f(286, "GAMMADIST", 4, 4, V),
    f(287, "GAMMAINV", 3, 3, V),
    f(288, "CEILING", 2, 2, V),
    f(289, "HYPGEOMDIST", 4, 4, V),
    f(290, "LOGNORMDIST", 3, 3, V),
    f(291, "LOGINV", 3, 3, V),
    f(292, "NEGBINOMDIST", 3, 3, V),
    f(293, "NORMDIST", 4, 4, V),
    f(294, "NORMSDIST", 1, 1, V),
    f(295, "NORMINV", 3, 3, V),
    f(296, "NORMSINV", 1, 1, V),
    f(297, "STANDARDIZE", 3, 3, V),
    f(298, "ODD", 1, 1, V),
    f(299, "PERMUT", 2, 2, V),
    f(300, "POISSON", 3, 3, V),
    f(301, "TDIST", 3, 3, V),
    f(302, "WEIBULL", 4, 4, V),
    f(303, "SUMXMY2", 2, 2, V),
    f(304, "SUMX2MY2", 2, 2, V),
    f(305, "SUMX2PY2", 2, 2, V),
    f(306, "CHITEST", 2, 2, V),
    f(307, "CORREL", 2, 2, V),
    f(308, "COVAR", 2, 2, V),
    f(309, "FORECAST", 3, 3, V),
    f(310, "FTEST", 2, 2, V),
    f(311, "INTERCEPT", 2, 2, V),
    f(312, "PEARSON", 2, 2, V),
    f(313, "RSQ", 2, 2, V),
    f(314, "STEYX", 2, 2, V),
    f(315, "SLOPE", 2, 2, V),
    f(316, "TTEST", 4, 4, V),
    f(317, "PROB", 3, 4, V),
    f(318, "DEVSQ", 1, N, V),
    f(319, "GEOMEAN", 1, N, V),
    f(320, "HARMEAN", 1, N, V),
    f(321, "SUMSQ", 0, N, V),
    f(322, "KURT", 1, N, V),
    f(323, "SKEW", 1, N, V),
    f(324, "ZTEST", 2, 3, V),
    f(325, "LARGE", 2, 2, V),
    f(326, "SMALL", 2, 2, V),
    f(327, "QUARTILE", 2, 2, V),
    f(328, "PERCENTILE", 2, 2, V),
    f(329, "PERCENTRANK", 2, 3, V),
    f(330, "MODE", 1, N, V),
    f(331, "TRIMMEAN", 2, 2, V),
    f(332, "TINV", 2, 2, V),
    f(334, "MOVIE.COMMAND", 3, 4, V),
    f(335, "GET.MOVIE", 1, 2, V),
    f(336, "CONCATENATE", 0, N, V),
    f(337, "POWER", 2, 2, V),
    f(338, "PIVOT.ADD.DATA", 2, 9, V),
    f(339, "GET.PIVOT.TABLE", 1, 2, V),
    f(340, "GET.PIVOT.FIELD", 1, 3, V),
    f(341, "GET.PIVOT.ITEM", 1, 4, V),
    f(342, "RADIANS", 1, 1, V),
    f(343, "DEGREES", 1, 1, V),
    f(344, "SUBTOTAL", 2, N, V),
    f(345, "SUMIF", 2, 3, V),
    f(346, "COUNTIF", 2, 2, V),
    f(347, "COUNTBLANK", 1, 1, V),
    f(348, "SCENARIO.GET", 1, 2, V),
    f(349, "OPTIONS.LISTS.GET", 1, 2, V),
    f(350, "ISPMT", 4, 4, V),
    f(351, "DATEDIF", 3, 3, V),
    f(352, "DATESTRING", 1, 1, V),
    f(353, "NUMBERSTRING", 2, 2, V),
    f(354, "ROMAN", 1, 2, V),
    f(355, "OPEN.DIALOG", 0, 4, V),
    f(356, "SAVE.DIALOG", 0, 5, V),
    f(357, "VIEW.GET", 1, 2, V),
    f(358, "GETPIVOTDATA", 2, N, V),
    f(359, "HYPERLINK", 1, 2, V),
    f(360, "PHONETIC", 1, 1, V),
    f(361, "AVERAGEA", 1, N, V),
    f(362, "MAXA", 1, N, V),
    f(363, "MINA", 1, N, V),
    f(364, "STDEVPA", 1, N, V),
    f(365, "VARPA", 1, N, V),
    f(366, "STDEVA", 1, N, V),
    f(367, "VARA", 1, N, V),
    f(368, "BAHTTEXT", 1, 1, V),
    f(369, "THAIDAYOFWEEK", 1, 1, V),
    f(370, "THAIDIGIT", 1, 1, V),
    f(371, "THAIMONTHOFYEAR", 1, 1, V),
    f(372, "THAINUMSOUND", 1, 1, V),
    f(373, "THAINUMSTRING", 1, 1, V),
    f(374, "THAISTRINGLENGTH", 1, 1, V),
    f(375, "ISTHAIDIGIT", 1, 1, V),
    f(376, "ROUNDBAHTDOWN", 1, 1, V),
    f(377, "ROUNDBAHTUP", 1, 1, V),
    f(378, "THAIYEAR", 1, 1, V),
    f(379, "RTD", 3, N, V),
    f(380, "CUBEVALUE", 1, N, V),
    f(381, "CUBEMEMBER", 2, 3, V),
    f(382, "CUBEMEMBERPROPERTY", 3, 3, V),
    f(383, "CUBERANKEDMEMBER", 3, 4, V),
    f(384, "HEX2BIN", 1, 2, V),
    f(385, "HEX2DEC", 1, 1, V),
    f(386, "HEX2OCT", 1, 2, V),
    f(387, "DEC2BIN", 1, 2, V),
    f(388, "DEC2HEX", 1, 2, V),
    f(389, "DEC2OCT", 1, 2, V),
    f(390, "OCT2BIN", 1, 2, V),
    f(391, "OCT2HEX", 1, 2, V),
    f(392, "OCT2DEC", 1, 1, V),
    f(393, "BIN2DEC", 1, 1, V),
    f(394, "BIN2OCT", 1, 2, V),
    f(395, "BIN2HEX", 1, 2, V),
    f(396, "IMSUB", 2, 2, V),
    f(397, "IMDIV", 2, 2, V),
    f(398, "IMPOWER", 2, 2, V),
    f(399, "IMABS", 1, 1, V),
    f(400, "IMSQRT", 1, 1, V),
    f(401, "IMLN", 1, 1, V),
    f(402, "IMLOG2", 1, 1, V),
    f(403, "IMLOG10", 1, 1, V),
    f(404, "IMSIN", 1, 1, V),
    f(405, "IMCOS", 1, 1, V),
    f(406, "IMEXP", 1, 1, V),
    f(407, "IMARGUMENT", 1, 1, V),
    f(408, "IMCONJUGATE", 1, 1, V),
    f(409, "IMAGINARY", 1, 1, V),
    f(410, "IMREAL", 1, 1, V),
    f(411, "COMPLEX", 2, 3, V),
    f(412, "IMSUM", 1, N, V),
    f(413, "IMPRODUCT", 1, N, V),
    f(414, "SERIESSUM", 4, 4, V),
    f(415, "FACTDOUBLE", 1, 1, V),
    f(416, "SQRTPI", 1, 1, V),
    f(417, "QUOTIENT", 2, 2, V),
    f(418, "DELTA", 1, 2, V),
    f(419, "GESTEP", 1, 2, V),
    f(420, "ISEVEN", 1, 1, V),
    f(421, "ISODD", 1, 1, V),
    f(422, "MROUND", 2, 2, V),
    f(423, "ERF", 1, 2, V),
    f(424, "ERFC", 1, 1, V),
    f(425, "BESSELJ", 2, 2, V),
    f(426, "BESSELK", 2, 2, V),
    f(427, "BESSELY", 2, 2, V),
    f(428, "BESSELI", 2, 2, V),
    f(429, "XIRR", 2, 3, V),
    f(430, "XNPV", 3, 3, V),
    f(431, "PRICEMAT", 5, 6, V),
    f(432, "YIELDMAT", 5, 6, V),
    f(433, "INTRATE", 4, 5, V),
    f(434, "RECEIVED", 4, 5, V),
    f(435, "DISC", 4, 5, V),
    f(436, "PRICEDISC", 4, 5, V),
    f(437, "YIELDDISC", 4, 5, V),
    f(438, "TBILLEQ", 3, 3, V),
    f(439, "TBILLPRICE", 3, 3, V),
    f(440, "TBILLYIELD", 3, 3, V),
    f(441, "PRICE", 6, 7, V),
    f(442, "YIELD", 6, 7, V),
    f(443, "DOLLARDE", 2, 2, V),
    f(444, "DOLLARFR", 2, 2, V),
    f(445, "NOMINAL", 2, 2, V),
    f(446, "EFFECT", 2, 2, V),
    f(447, "CUMPRINC", 6, 6, V),
    f(448, "CUMIPMT", 6, 6, V),
    f(449, "EDATE", 2, 2, V),
    f(450, "EOMONTH", 2, 2, V),
    f(451, "YEARFRAC", 2, 3, V),
    f(452, "COUPDAYBS", 3, 4, V),
    f(453, "COUPDAYS", 3, 4, V),
    f(454, "COUPDAYSNC", 3, 4, V),
    f(455, "COUPNCD", 3, 4, V),
    f(456, "COUPNUM", 3, 4, V),
    f(457, "COUPPCD", 3, 4, V),
    f(458, "DURATION", 5, 6, V),
    f(459, "MDURATION", 5, 6, V),
    f(460, "ODDLPRICE", 7, 8, V),
    f(461, "ODDLYIELD", 7, 8, V),
    f(462, "ODDFPRICE", 8, 9, V),
    f(463, "ODDFYIELD", 8, 9, V),
    volatile(f(464, "RANDBETWEEN", 2, 2, V)),
    f(465, "WEEKNUM", 1, 2, V),
    f(466, "AMORDEGRC", 6, 7, V),
    f(467, "AMORLINC", 6, 7, V),
    f(468, "CONVERT", 3, 3, V),
    f(469, "ACCRINT", 6, 8, V),
    f(470, "ACCRINTM", 4, 5, V),
    f(471, "WORKDAY", 2, 3, V),
    f(472, "NETWORKDAYS", 2, 3, V),
    f(473, "GCD", 1, N, V),
    f(474, "MULTINOMIAL", 1, N, V),
    f(475, "LCM", 1, N, V),
    f(476, "FVSCHEDULE", 2, 2, V),
    f(477, "CUBEKPIMEMBER", 3, 4, V),
    f(478, "CUBESET", 2, 5, V),
    f(479, "CUBESETCOUNT", 1, 1, V),
    f(480, "IFERROR", 2, 2, V),
    f(481, "COUNTIFS", 2, N, V),
    f(482, "SUMIFS", 3, N, V),
    f(483, "AVERAGEIF", 2, 3, V),
    f(484, "AVERAGEIFS", 3, N, V),
];

/// Look up the metadata for a built-in function index.
///
/// `None` is a normal outcome: the index may belong to a function newer than this table, an
/// add-in, or a macro-sheet command.
pub fn function_spec_from_id(id: u16) -> Option<FunctionSpec> {
    FUNCTION_SPECS
        .binary_search_by_key(&id, |spec| spec.id)
        .ok()
        .map(|idx| FUNCTION_SPECS[idx])
}

pub fn function_name_from_id(id: u16) -> Option<&'static str> {
    function_spec_from_id(id).map(|spec| spec.name)
}

static NAME_TO_INDEX: OnceLock<HashMap<&'static str, usize>> = OnceLock::new();

fn name_to_index() -> &'static HashMap<&'static str, usize> {
    NAME_TO_INDEX.get_or_init(|| {
        let mut map = HashMap::with_capacity(FUNCTION_SPECS.len());
        for (idx, spec) in FUNCTION_SPECS.iter().enumerate() {
            let prev = map.insert(spec.name, idx);
            debug_assert!(prev.is_none(), "duplicate function name {}", spec.name);
        }
        map
    })
}

/// Look up a function by display name.
///
/// Case-insensitive (ASCII); accepts the `_xlfn.` prefix used for forward-compatible names.
pub fn function_spec_from_name(name: &str) -> Option<FunctionSpec> {
    let upper = name.trim().to_ascii_uppercase();
    let normalized = upper.strip_prefix("_XLFN.").unwrap_or(&upper);
    name_to_index()
        .get(normalized)
        .map(|&idx| FUNCTION_SPECS[idx])
}

pub fn function_id_from_name(name: &str) -> Option<u16> {
    function_spec_from_name(name).map(|spec| spec.id)
}

/// All known built-in functions, in id order.
pub fn iter_function_specs() -> impl Iterator<Item = &'static FunctionSpec> {
    FUNCTION_SPECS.iter()
}
